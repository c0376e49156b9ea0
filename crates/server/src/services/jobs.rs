use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use enrichment::{BatchScheduler, TtlStore};

use super::scheduler::{JobResult, SchedulerJob};
use crate::config::Config;

/// Periodic enrichment batch run.
///
/// Delegates to the same `run_batch` entry point the manual API trigger
/// uses; there is no cron-only code path.
pub struct EnrichmentBatchJob {
    batch: Arc<BatchScheduler>,
    config: Arc<Config>,
}

impl EnrichmentBatchJob {
    pub fn new(batch: Arc<BatchScheduler>, config: Arc<Config>) -> Self {
        Self { batch, config }
    }
}

#[async_trait]
impl SchedulerJob for EnrichmentBatchJob {
    fn name(&self) -> &'static str {
        "EnrichmentBatch"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.config.batch_interval_secs)
    }

    async fn execute(&self) -> JobResult {
        let report = self
            .batch
            .run_batch(
                self.config.batch_anime_size,
                self.config.batch_characters_per_anime,
                self.config.batch_include_retries,
            )
            .await?;

        tracing::info!(
            "Scheduled enrichment batch: {} processed, {} succeeded, {} failed, {} skipped",
            report.processed,
            report.succeeded,
            report.failed,
            report.skipped
        );

        Ok(())
    }
}

/// Periodic reclamation of expired cache and lock entries.
pub struct CacheSweepJob {
    store: Arc<dyn TtlStore>,
    config: Arc<Config>,
}

impl CacheSweepJob {
    pub fn new(store: Arc<dyn TtlStore>, config: Arc<Config>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl SchedulerJob for CacheSweepJob {
    fn name(&self) -> &'static str {
        "CacheSweep"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.config.sweep_interval_secs)
    }

    async fn execute(&self) -> JobResult {
        let removed = self.store.sweep_expired().await?;
        if removed > 0 {
            tracing::info!("Swept {} expired kv entries", removed);
        }
        Ok(())
    }
}
