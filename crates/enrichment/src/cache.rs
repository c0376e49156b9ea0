use std::sync::Arc;
use std::time::Duration;

use domain::CharacterProfile;

use crate::error::EnrichmentError;
use crate::traits::TtlStore;

/// Cache key for one character's enrichment payload.
pub fn profile_cache_key(anime_id: i64, character_key: &str) -> String {
    format!("enrich-profile:{}:{}", anime_id, character_key)
}

/// TTL cache of previously-computed enrichment payloads.
///
/// An entry reflects the last successful enrichment and is written only
/// after the document-store write succeeded, or opportunistically when an
/// already-successful record is read.
pub struct ProfileCache {
    store: Arc<dyn TtlStore>,
    ttl: Duration,
}

impl ProfileCache {
    pub fn new(store: Arc<dyn TtlStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn get(&self, key: &str) -> Result<Option<CharacterProfile>, EnrichmentError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                // A corrupt entry is dropped rather than served.
                tracing::warn!("Discarding unparseable cache entry {}: {}", key, e);
                self.store.delete(key).await?;
                Ok(None)
            }
        }
    }

    pub async fn set(&self, key: &str, profile: &CharacterProfile) -> Result<(), EnrichmentError> {
        let raw = serde_json::to_string(profile)
            .map_err(|e| EnrichmentError::Store(format!("serialize cache entry: {}", e)))?;
        self.store.put(key, &raw, self.ttl).await
    }

    pub async fn invalidate(&self, key: &str) -> Result<(), EnrichmentError> {
        self.store.delete(key).await
    }

    /// Drop physically-expired entries. Periodic space reclamation, not
    /// required for correctness.
    pub async fn sweep_expired(&self) -> Result<u64, EnrichmentError> {
        self.store.sweep_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTtlStore;

    fn profile(analysis: &str) -> CharacterProfile {
        CharacterProfile {
            personality_analysis: analysis.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let cache = ProfileCache::new(Arc::new(MemoryTtlStore::new()), Duration::from_secs(60));
        let key = profile_cache_key(1, "abc");

        cache.set(&key, &profile("stoic swordsman")).await.unwrap();
        let hit = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(hit.personality_analysis, "stoic swordsman");
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let cache = ProfileCache::new(Arc::new(MemoryTtlStore::new()), Duration::from_millis(10));
        let key = profile_cache_key(1, "abc");

        cache.set(&key, &profile("x")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = ProfileCache::new(Arc::new(MemoryTtlStore::new()), Duration::from_secs(60));
        let key = profile_cache_key(1, "abc");

        cache.set(&key, &profile("x")).await.unwrap();
        cache.invalidate(&key).await.unwrap();
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_dropped() {
        let store = Arc::new(MemoryTtlStore::new());
        let cache = ProfileCache::new(store.clone(), Duration::from_secs(60));
        let key = profile_cache_key(1, "abc");

        store.put(&key, "not json", Duration::from_secs(60)).await.unwrap();
        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(store.get(&key).await.unwrap().is_none());
    }
}
