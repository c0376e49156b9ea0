use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

/// Enrichment lifecycle status for a single character.
///
/// Transitions: `Unset`/`Pending` -> `Success`|`Failed`|`Skipped`.
/// `Failed` goes back to `Pending` only through retry eligibility or an
/// explicit admin reset. `Success` is never automatically overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
    #[default]
    Unset,
    Pending,
    Success,
    Failed,
    Skipped,
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStatus::Unset => "unset",
            EnrichmentStatus::Pending => "pending",
            EnrichmentStatus::Success => "success",
            EnrichmentStatus::Failed => "failed",
            EnrichmentStatus::Skipped => "skipped",
        }
    }
}

impl FromStr for EnrichmentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "pending" => EnrichmentStatus::Pending,
            "success" => EnrichmentStatus::Success,
            "failed" => EnrichmentStatus::Failed,
            "skipped" => EnrichmentStatus::Skipped,
            _ => EnrichmentStatus::Unset,
        })
    }
}

/// Curator flag that excludes a character from all automatic enrichment,
/// regardless of its status or attempt count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ManualProtection {
    #[serde(default)]
    pub protected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<DateTime<Utc>>,
}

/// Generated biographical/analytical payload merged into a character
/// after a successful backend call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CharacterProfile {
    pub personality_analysis: String,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub notable_quotes: Vec<String>,
}

/// Enrichment tracking state embedded in each character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnrichmentState {
    #[serde(default)]
    pub status: EnrichmentStatus,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enriched_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<CharacterProfile>,
    #[serde(default)]
    pub protection: ManualProtection,
}

/// A character embedded in its parent anime record.
///
/// Characters are not independently addressable rows; they live inside the
/// anime's character array and are identified by `key`, a stable synthetic
/// key assigned at ingestion. `name` is only unique within one anime and is
/// used as a lookup shim for caller-supplied names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CharacterRecord {
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub enrichment: EnrichmentState,
}

impl CharacterRecord {
    pub fn new(anime_source_id: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: character_key(anime_source_id, &name),
            name,
            role: None,
            description: None,
            enrichment: EnrichmentState::default(),
        }
    }
}

/// An ingested anime with its embedded character list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnimeRecord {
    pub id: i64,
    pub source_id: String,
    pub title: String,
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive the stable synthetic identity key for a character.
///
/// Assigned once at ingestion and never recomputed from a mutated name, so
/// renames do not orphan enrichment state.
pub fn character_key(anime_source_id: &str, character_name: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(anime_source_id.as_bytes());
    hasher.update(b":");
    hasher.update(character_name.as_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}
