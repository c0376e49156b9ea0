use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::EnrichmentError;
use crate::traits::TtlStore;

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory [`TtlStore`] backed by a single mutex.
///
/// Used by tests and single-process deployments; `put_if_absent` is
/// atomic because the check and the insert happen under one lock.
#[derive(Default)]
pub struct MemoryTtlStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EnrichmentError> {
        let entries = self.entries.lock();
        Ok(entries
            .get(key)
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EnrichmentError> {
        self.entries.lock().insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn put_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, EnrichmentError> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        if let Some(existing) = entries.get(key) {
            if existing.expires_at > now {
                return Ok(false);
            }
        }

        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), EnrichmentError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64, EnrichmentError> {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_returns_none_after_expiry() {
        let store = MemoryTtlStore::new();
        store
            .put("k", "v", Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(20)).await;
        // Expired but not yet swept: still invisible to readers.
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_put_if_absent_blocks_live_entry() {
        let store = MemoryTtlStore::new();
        assert!(store
            .put_if_absent("k", "a", Duration::from_secs(60))
            .await
            .unwrap());
        assert!(!store
            .put_if_absent("k", "b", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_put_if_absent_takes_over_expired_entry() {
        let store = MemoryTtlStore::new();
        store
            .put_if_absent("k", "a", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(store
            .put_if_absent("k", "b", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_sweep_reclaims_expired_entries() {
        let store = MemoryTtlStore::new();
        store
            .put("short", "v", Duration::from_millis(10))
            .await
            .unwrap();
        store.put("long", "v", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.sweep_expired().await.unwrap(), 1);
        assert_eq!(store.len(), 1);
    }
}
