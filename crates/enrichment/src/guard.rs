use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use crate::error::EnrichmentError;
use crate::traits::TtlStore;

/// Lock key for one (anime, character) orchestration.
pub fn enrich_lock_key(anime_id: i64, character_key: &str) -> String {
    format!("enrich-lock:{}:{}", anime_id, character_key)
}

/// Mutual-exclusion guard for in-flight enrichments, keyed by
/// (anime, character) and backed by a TTL store.
///
/// Acquisition is an atomic put-if-absent, so two concurrent callers
/// cannot both win. A holder that never releases self-heals via TTL
/// expiry; a second caller may then duplicate work if the first is still
/// genuinely running, an accepted availability-over-exclusivity
/// trade-off since enrichment merges are idempotent.
pub struct ConcurrencyGuard {
    store: Arc<dyn TtlStore>,
    ttl: Duration,
}

impl ConcurrencyGuard {
    pub fn new(store: Arc<dyn TtlStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Try to take the lock. `false` means another orchestration is in
    /// progress for this key.
    pub async fn try_acquire(&self, key: &str) -> Result<bool, EnrichmentError> {
        let acquired_at = Utc::now().to_rfc3339();
        self.store.put_if_absent(key, &acquired_at, self.ttl).await
    }

    /// Release the lock. Must run on every exit path; failure to release
    /// is logged and left to TTL expiry.
    pub async fn release(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            tracing::warn!("Failed to release lock {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTtlStore;

    fn guard(ttl: Duration) -> ConcurrencyGuard {
        ConcurrencyGuard::new(Arc::new(MemoryTtlStore::new()), ttl)
    }

    #[tokio::test]
    async fn test_second_acquire_fails_while_held() {
        let guard = guard(Duration::from_secs(120));
        let key = enrich_lock_key(1, "abc");

        assert!(guard.try_acquire(&key).await.unwrap());
        assert!(!guard.try_acquire(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_frees_the_key() {
        let guard = guard(Duration::from_secs(120));
        let key = enrich_lock_key(1, "abc");

        assert!(guard.try_acquire(&key).await.unwrap());
        guard.release(&key).await;
        assert!(guard.try_acquire(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_lock_self_heals() {
        let guard = guard(Duration::from_millis(10));
        let key = enrich_lock_key(1, "abc");

        assert!(guard.try_acquire(&key).await.unwrap());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(guard.try_acquire(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_contend() {
        let guard = guard(Duration::from_secs(120));

        assert!(guard.try_acquire(&enrich_lock_key(1, "abc")).await.unwrap());
        assert!(guard.try_acquire(&enrich_lock_key(1, "def")).await.unwrap());
        assert!(guard.try_acquire(&enrich_lock_key(2, "abc")).await.unwrap());
    }
}
