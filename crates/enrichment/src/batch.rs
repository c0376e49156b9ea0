use chrono::Utc;
use std::sync::Arc;

use domain::BatchReport;

use crate::error::EnrichmentError;
use crate::locator::select_eligible;
use crate::orchestrator::EnrichmentOrchestrator;
use crate::policy::RetryPolicy;
use crate::traits::AnimeStore;

/// Fans enrichment out across many anime with fixed pacing and per-item
/// failure isolation.
///
/// `run_batch` is the single entry point for both cron-triggered and
/// manual runs; there is no divergent code path.
pub struct BatchScheduler {
    store: Arc<dyn AnimeStore>,
    orchestrator: Arc<EnrichmentOrchestrator>,
    policy: RetryPolicy,
}

impl BatchScheduler {
    pub fn new(
        store: Arc<dyn AnimeStore>,
        orchestrator: Arc<EnrichmentOrchestrator>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            orchestrator,
            policy,
        }
    }

    /// Enrich up to `max_characters` eligible characters of one anime,
    /// sequentially, pacing calls with the inter-item delay.
    pub async fn enrich_anime(
        &self,
        anime_id: i64,
        max_characters: u32,
        include_retries: bool,
    ) -> Result<BatchReport, EnrichmentError> {
        let anime = self
            .store
            .get_anime(anime_id)
            .await?
            .ok_or_else(|| EnrichmentError::NotFound(format!("anime {}", anime_id)))?;

        let eligible: Vec<_> =
            select_eligible(&anime.characters, include_retries, &self.policy, Utc::now())
                .into_iter()
                .take(max_characters as usize)
                .cloned()
                .collect();

        if eligible.is_empty() {
            tracing::debug!("No eligible characters in anime {} ('{}')", anime_id, anime.title);
            return Ok(BatchReport::default());
        }

        tracing::info!(
            "Enriching {} character(s) in anime {} ('{}')",
            eligible.len(),
            anime_id,
            anime.title
        );

        let mut report = BatchReport::default();
        for (i, character) in eligible.iter().enumerate() {
            if i > 0 {
                // Fixed pacing between characters to respect upstream
                // rate limits.
                tokio::time::sleep(self.policy.inter_item_delay).await;
            }
            let outcome = self.orchestrator.enrich_one(&anime, character).await;
            report.record(outcome);
        }

        Ok(report)
    }

    /// Run one enrichment batch across the corpus.
    ///
    /// Fetches an oversized candidate page (2x `anime_batch_size`), keeps
    /// the first `anime_batch_size` anime that have at least one eligible
    /// character, and processes them sequentially. One anime's failure
    /// never aborts the batch.
    pub async fn run_batch(
        &self,
        anime_batch_size: u32,
        characters_per_anime: u32,
        include_retries: bool,
    ) -> Result<BatchReport, EnrichmentError> {
        let candidates = self
            .store
            .list_anime_page(0, anime_batch_size.saturating_mul(2))
            .await?;

        let now = Utc::now();
        let viable: Vec<i64> = candidates
            .iter()
            .filter(|anime| {
                !select_eligible(&anime.characters, include_retries, &self.policy, now).is_empty()
            })
            .take(anime_batch_size as usize)
            .map(|anime| anime.id)
            .collect();

        tracing::info!(
            "Enrichment batch: {} candidate(s), {} viable",
            candidates.len(),
            viable.len()
        );

        let mut aggregate = BatchReport::default();
        for (i, anime_id) in viable.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.policy.inter_anime_delay).await;
            }

            match self
                .enrich_anime(*anime_id, characters_per_anime, include_retries)
                .await
            {
                Ok(report) => aggregate.merge(report),
                Err(e) => {
                    // Isolate per-anime failures; the rest of the batch
                    // continues.
                    tracing::error!("Enrichment of anime {} failed: {}", anime_id, e);
                }
            }
        }

        tracing::info!(
            "Enrichment batch completed: {} processed, {} succeeded, {} failed, {} skipped",
            aggregate.processed,
            aggregate.succeeded,
            aggregate.failed,
            aggregate.skipped
        );

        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTtlStore;
    use crate::mocks::{test_anime, test_profile, MockAnimeStore, MockProfileBackend};
    use domain::EnrichmentStatus;

    fn scheduler(
        store: Arc<MockAnimeStore>,
        backend: Arc<MockProfileBackend>,
    ) -> BatchScheduler {
        let policy = RetryPolicy::immediate();
        let orchestrator = Arc::new(EnrichmentOrchestrator::new(
            store.clone(),
            backend,
            Arc::new(MemoryTtlStore::new()),
            policy.clone(),
        ));
        BatchScheduler::new(store, orchestrator, policy)
    }

    #[tokio::test]
    async fn test_enrich_anime_counts_single_success() {
        let store = Arc::new(MockAnimeStore::new());
        store.insert(test_anime(1, "Naruto", &["Naruto Uzumaki", "Sakura Haruno"]));

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("ninja")));

        let report = scheduler(store.clone(), backend)
            .enrich_anime(1, 1, false)
            .await
            .unwrap();

        assert_eq!(
            report,
            BatchReport {
                processed: 1,
                succeeded: 1,
                failed: 0,
                skipped: 0
            }
        );
    }

    #[tokio::test]
    async fn test_enrich_anime_mixed_outcomes() {
        let store = Arc::new(MockAnimeStore::new());
        store.insert(test_anime(1, "Naruto", &["Naruto Uzumaki", "X"]));

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("ninja")));

        let report = scheduler(store.clone(), backend)
            .enrich_anime(1, 10, false)
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 1);
    }

    #[tokio::test]
    async fn test_enrich_anime_unknown_id_errors() {
        let store = Arc::new(MockAnimeStore::new());
        let backend = Arc::new(MockProfileBackend::new());

        let result = scheduler(store, backend).enrich_anime(42, 5, false).await;
        assert!(matches!(result, Err(EnrichmentError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_run_batch_skips_anime_without_eligible_characters() {
        let store = Arc::new(MockAnimeStore::new());
        store.insert(test_anime(1, "Naruto", &["Naruto Uzumaki"]));

        let mut done = test_anime(2, "Bleach", &["Ichigo Kurosaki"]);
        done.characters[0].enrichment.status = EnrichmentStatus::Success;
        store.insert(done);

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("protagonist")));

        let report = scheduler(store.clone(), backend.clone())
            .run_batch(10, 5, false)
            .await
            .unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(backend.comprehensive_calls(), 1);
    }

    #[tokio::test]
    async fn test_run_batch_isolates_per_anime_failures() {
        let store = Arc::new(MockAnimeStore::new());
        store.insert(test_anime(1, "Naruto", &["Naruto Uzumaki"]));
        store.insert(test_anime(2, "Bleach", &["Ichigo Kurosaki"]));
        store.insert(test_anime(3, "One Piece", &["Monkey D. Luffy"]));

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("protagonist")));

        let sched = scheduler(store.clone(), backend);
        // The candidate page is read before the injected failure so anime 2
        // stays in the viable list, then its per-anime run fails.
        store.fail_get(2);

        let report = sched.run_batch(10, 5, false).await.unwrap();

        // Anime 1 and 3 still processed despite anime 2 failing outright.
        assert_eq!(report.processed, 2);
        assert_eq!(report.succeeded, 2);
    }

    #[tokio::test]
    async fn test_run_batch_respects_batch_size() {
        let store = Arc::new(MockAnimeStore::new());
        for id in 1..=5 {
            store.insert(test_anime(id, &format!("Anime {}", id), &["Lead Character"]));
        }

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("lead")));

        let report = scheduler(store, backend).run_batch(2, 5, false).await.unwrap();
        assert_eq!(report.processed, 2);
    }
}
