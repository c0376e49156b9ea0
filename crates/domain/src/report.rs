use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::anime::{CharacterRecord, EnrichmentStatus};

/// Terminal outcome of one orchestration run for one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrichOutcome {
    Success,
    Failed,
    Skipped,
    /// Another orchestration currently holds the lock for this character.
    InProgress,
}

/// Aggregate counters returned by per-anime and batch runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl BatchReport {
    pub fn record(&mut self, outcome: EnrichOutcome) {
        self.processed += 1;
        match outcome {
            EnrichOutcome::Success => self.succeeded += 1,
            EnrichOutcome::Failed | EnrichOutcome::InProgress => self.failed += 1,
            EnrichOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.processed += other.processed;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Structured status for user-triggered single-character enrichment.
/// Returned instead of thrown errors so callers can render state without
/// exception handling in the common path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OnDemandStatus {
    Success,
    Failed,
    Error,
    NotFound,
    InProgress,
}

/// Report for a user-triggered "enrich now" call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OnDemandReport {
    pub from_cache: bool,
    pub triggered: bool,
    pub enriched: bool,
    pub status: OnDemandStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character: Option<CharacterRecord>,
}

impl OnDemandReport {
    pub fn not_found() -> Self {
        Self {
            from_cache: false,
            triggered: false,
            enriched: false,
            status: OnDemandStatus::NotFound,
            character: None,
        }
    }
}

/// Result of an admin reset of enrichment tracking state.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResetReport {
    pub characters_reset: u32,
    pub reset_to: EnrichmentStatus,
}
