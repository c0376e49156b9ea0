use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use domain::{
    AnimeRecord, CharacterPatch, CharacterProfile, CharacterRecord, Clearable, EnrichOutcome,
    EnrichmentStatus, OnDemandReport, OnDemandStatus,
};

use crate::cache::{profile_cache_key, ProfileCache};
use crate::error::EnrichmentError;
use crate::guard::{enrich_lock_key, ConcurrencyGuard};
use crate::matcher::locate_character;
use crate::policy::RetryPolicy;
use crate::traits::{AnimeStore, ProfileBackend, ProfileRequest, TtlStore};

/// Drives one character at a time through the enrichment state machine.
///
/// The orchestrator is an error sink: per-character failures become
/// recorded enrichment state and never propagate to the caller.
pub struct EnrichmentOrchestrator {
    store: Arc<dyn AnimeStore>,
    backend: Arc<dyn ProfileBackend>,
    cache: ProfileCache,
    guard: ConcurrencyGuard,
    policy: RetryPolicy,
}

impl EnrichmentOrchestrator {
    pub fn new(
        store: Arc<dyn AnimeStore>,
        backend: Arc<dyn ProfileBackend>,
        ttl_store: Arc<dyn TtlStore>,
        policy: RetryPolicy,
    ) -> Self {
        let cache = ProfileCache::new(Arc::clone(&ttl_store), policy.cache_ttl);
        let guard = ConcurrencyGuard::new(ttl_store, policy.lock_ttl);
        Self {
            store,
            backend,
            cache,
            guard,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    /// Enrich one character from an automatic (batch/cron) run.
    pub async fn enrich_one(
        &self,
        anime: &AnimeRecord,
        character: &CharacterRecord,
    ) -> EnrichOutcome {
        self.enrich_character(anime, character, false).await
    }

    /// Full state machine for one character.
    ///
    /// `force_refresh` bypasses the payload cache so a fresh backend call
    /// is made even when a cached profile exists.
    pub async fn enrich_character(
        &self,
        anime: &AnimeRecord,
        character: &CharacterRecord,
        force_refresh: bool,
    ) -> EnrichOutcome {
        let now = Utc::now();
        let attempts = character.enrichment.attempts + 1;

        if character.name.trim().chars().count() < 2 {
            let patch = CharacterPatch {
                status: Some(EnrichmentStatus::Skipped),
                attempts: Some(attempts),
                last_attempt_at: Clearable::Set(now),
                last_error: Clearable::Set("name too short".to_string()),
                ..Default::default()
            };
            let _ = self.persist(anime.id, &character.key, patch).await;
            return EnrichOutcome::Skipped;
        }

        // Mark pending before any suspension point so concurrent selection
        // sees fresh state.
        let pending = CharacterPatch {
            status: Some(EnrichmentStatus::Pending),
            attempts: Some(attempts),
            last_attempt_at: Clearable::Set(now),
            ..Default::default()
        };
        match self.persist(anime.id, &character.key, pending).await {
            Ok(true) => {}
            // Character vanished between selection and persist; a no-op,
            // not a hard failure.
            Ok(false) => return EnrichOutcome::Skipped,
            Err(e) => {
                return self
                    .finish_failed(anime.id, &character.key, format!("store: {}", e))
                    .await;
            }
        }

        let cache_key = profile_cache_key(anime.id, &character.key);
        if !force_refresh {
            match self.cache.get(&cache_key).await {
                Ok(Some(profile)) => {
                    tracing::debug!(
                        "Cache hit for character '{}' in anime {}",
                        character.name,
                        anime.id
                    );
                    return self
                        .finish_success(anime.id, &character.key, profile, false)
                        .await;
                }
                Ok(None) => {}
                // A cache read failure is a miss, not a fatal error.
                Err(e) => tracing::warn!("Cache read failed for {}: {}", cache_key, e),
            }
        }

        let lock_key = enrich_lock_key(anime.id, &character.key);
        match self.guard.try_acquire(&lock_key).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(
                    "Enrichment already in progress for character '{}' in anime {}",
                    character.name,
                    anime.id
                );
                return EnrichOutcome::InProgress;
            }
            Err(e) => {
                return self
                    .finish_failed(anime.id, &character.key, format!("lock store: {}", e))
                    .await;
            }
        }

        let outcome = match self.call_backends(anime, character).await {
            Ok(profile) => {
                self.finish_success(anime.id, &character.key, profile, true)
                    .await
            }
            Err(e) => {
                self.finish_failed(anime.id, &character.key, e.to_string())
                    .await
            }
        };

        self.guard.release(&lock_key).await;
        outcome
    }

    /// User-triggered "enrich now" for a single named character.
    ///
    /// Returns a structured report rather than an error so callers render
    /// state without exception handling in the common path.
    pub async fn enrich_on_demand(
        &self,
        anime_id: i64,
        character_name: &str,
        force_refresh: bool,
    ) -> OnDemandReport {
        let anime = match self.store.get_anime(anime_id).await {
            Ok(Some(anime)) => anime,
            Ok(None) => return OnDemandReport::not_found(),
            Err(e) => {
                tracing::error!("Failed to load anime {}: {}", anime_id, e);
                return OnDemandReport {
                    from_cache: false,
                    triggered: false,
                    enriched: false,
                    status: OnDemandStatus::Error,
                    character: None,
                };
            }
        };

        let Some(idx) = locate_character(&anime.characters, character_name) else {
            tracing::info!(
                "No character matching '{}' in anime {} ('{}')",
                character_name,
                anime_id,
                anime.title
            );
            return OnDemandReport::not_found();
        };
        let character = anime.characters[idx].clone();
        let cache_key = profile_cache_key(anime_id, &character.key);

        if force_refresh {
            if let Err(e) = self.cache.invalidate(&cache_key).await {
                tracing::warn!("Failed to invalidate cache {}: {}", cache_key, e);
            }
        } else if character.enrichment.status == EnrichmentStatus::Success {
            // Already enriched: serve without touching any backend.
            let from_cache = matches!(self.cache.get(&cache_key).await, Ok(Some(_)));
            if !from_cache {
                // Opportunistically re-populate the cache from the record.
                if let Some(profile) = &character.enrichment.profile {
                    if let Err(e) = self.cache.set(&cache_key, profile).await {
                        tracing::warn!("Failed to re-populate cache {}: {}", cache_key, e);
                    }
                }
            }
            return OnDemandReport {
                from_cache,
                triggered: false,
                enriched: true,
                status: OnDemandStatus::Success,
                character: Some(character),
            };
        }

        let outcome = self
            .enrich_character(&anime, &character, force_refresh)
            .await;

        let status = match outcome {
            EnrichOutcome::Success => OnDemandStatus::Success,
            EnrichOutcome::Failed | EnrichOutcome::Skipped => OnDemandStatus::Failed,
            EnrichOutcome::InProgress => OnDemandStatus::InProgress,
        };

        // Report the freshly persisted state where available.
        let updated = match self.store.get_anime(anime_id).await {
            Ok(Some(current)) => current
                .characters
                .into_iter()
                .find(|c| c.key == character.key),
            _ => Some(character),
        };

        OnDemandReport {
            from_cache: false,
            triggered: outcome != EnrichOutcome::InProgress,
            enriched: outcome == EnrichOutcome::Success,
            status,
            character: updated,
        }
    }

    /// Call the primary tier, falling back to the secondary with the same
    /// inputs. The recorded error is the secondary's when it ran.
    async fn call_backends(
        &self,
        anime: &AnimeRecord,
        character: &CharacterRecord,
    ) -> Result<CharacterProfile, EnrichmentError> {
        let mut known_fields = BTreeMap::new();
        if let Some(role) = &character.role {
            known_fields.insert("role".to_string(), role.clone());
        }
        if let Some(description) = &character.description {
            known_fields.insert("description".to_string(), description.clone());
        }

        let request = ProfileRequest {
            character_name: character.name.clone(),
            anime_title: anime.title.clone(),
            known_fields,
            idempotency_token: format!(
                "{}:{}:{}",
                anime.id,
                character.key,
                Utc::now().timestamp_millis()
            ),
        };

        match self.backend.comprehensive(&request).await {
            Ok(profile) => Ok(profile),
            Err(primary_err) => {
                tracing::warn!(
                    "Comprehensive tier failed for '{}' ({}), falling back: {}",
                    character.name,
                    anime.title,
                    primary_err
                );
                self.backend.detailed(&request).await
            }
        }
    }

    async fn finish_success(
        &self,
        anime_id: i64,
        character_key: &str,
        profile: CharacterProfile,
        write_cache: bool,
    ) -> EnrichOutcome {
        let patch = CharacterPatch {
            status: Some(EnrichmentStatus::Success),
            enriched_at: Some(Utc::now()),
            profile: Some(profile.clone()),
            last_error: Clearable::Clear,
            ..Default::default()
        };

        if !matches!(self.persist(anime_id, character_key, patch).await, Ok(true)) {
            return EnrichOutcome::Failed;
        }

        // Cache only after the document-store write succeeded.
        if write_cache {
            let cache_key = profile_cache_key(anime_id, character_key);
            if let Err(e) = self.cache.set(&cache_key, &profile).await {
                tracing::warn!("Failed to write cache {}: {}", cache_key, e);
            }
        }

        EnrichOutcome::Success
    }

    async fn finish_failed(
        &self,
        anime_id: i64,
        character_key: &str,
        error: String,
    ) -> EnrichOutcome {
        tracing::warn!(
            "Enrichment failed for character {} in anime {}: {}",
            character_key,
            anime_id,
            error
        );
        let patch = CharacterPatch {
            status: Some(EnrichmentStatus::Failed),
            last_error: Clearable::Set(error),
            ..Default::default()
        };
        let _ = self.persist(anime_id, character_key, patch).await;
        EnrichOutcome::Failed
    }

    /// `Ok(false)` means the anime or character no longer exists; a store
    /// failure stays an error so callers can tell the two apart.
    async fn persist(
        &self,
        anime_id: i64,
        character_key: &str,
        patch: CharacterPatch,
    ) -> Result<bool, EnrichmentError> {
        match self.store.update_character(anime_id, character_key, patch).await {
            Ok(true) => Ok(true),
            Ok(false) => {
                tracing::warn!(
                    "Character {} vanished from anime {} during enrichment",
                    character_key,
                    anime_id
                );
                Ok(false)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to persist character {} in anime {}: {}",
                    character_key,
                    anime_id,
                    e
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTtlStore;
    use crate::mocks::{test_anime, test_profile, MockAnimeStore, MockProfileBackend};

    fn orchestrator(
        store: Arc<MockAnimeStore>,
        backend: Arc<MockProfileBackend>,
        ttl: Arc<MemoryTtlStore>,
    ) -> EnrichmentOrchestrator {
        EnrichmentOrchestrator::new(store, backend, ttl, RetryPolicy::immediate())
    }

    #[tokio::test]
    async fn test_enrich_one_success_records_profile_and_attempt() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "Naruto", &["Naruto Uzumaki"]);
        store.insert(anime.clone());

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("ninja who never gives up")));

        let orch = orchestrator(store.clone(), backend.clone(), Arc::new(MemoryTtlStore::new()));
        let outcome = orch.enrich_one(&anime, &anime.characters[0]).await;

        assert_eq!(outcome, EnrichOutcome::Success);
        assert_eq!(backend.comprehensive_calls(), 1);
        assert_eq!(backend.detailed_calls(), 0);

        let stored = store.character(1, &anime.characters[0].key).unwrap();
        assert_eq!(stored.enrichment.status, EnrichmentStatus::Success);
        assert_eq!(stored.enrichment.attempts, 1);
        assert!(stored.enrichment.enriched_at.is_some());
        assert_eq!(
            stored.enrichment.profile.unwrap().personality_analysis,
            "ninja who never gives up"
        );
    }

    #[tokio::test]
    async fn test_short_name_is_skipped_without_backend_call() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "Naruto", &["X"]);
        store.insert(anime.clone());

        let backend = Arc::new(MockProfileBackend::new());
        let orch = orchestrator(store.clone(), backend.clone(), Arc::new(MemoryTtlStore::new()));

        let outcome = orch.enrich_one(&anime, &anime.characters[0]).await;
        assert_eq!(outcome, EnrichOutcome::Skipped);
        assert_eq!(backend.comprehensive_calls(), 0);

        let stored = store.character(1, &anime.characters[0].key).unwrap();
        assert_eq!(stored.enrichment.status, EnrichmentStatus::Skipped);
        assert_eq!(stored.enrichment.attempts, 1);
        assert_eq!(stored.enrichment.last_error.as_deref(), Some("name too short"));
    }

    #[tokio::test]
    async fn test_falls_back_to_detailed_tier() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "One Piece", &["Roronoa Zoro"]);
        store.insert(anime.clone());

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Err("comprehensive tier overloaded".to_string()));
        backend.set_detailed(Ok(test_profile("stoic swordsman")));

        let orch = orchestrator(store.clone(), backend.clone(), Arc::new(MemoryTtlStore::new()));
        let outcome = orch.enrich_one(&anime, &anime.characters[0]).await;

        assert_eq!(outcome, EnrichOutcome::Success);
        assert_eq!(backend.comprehensive_calls(), 1);
        assert_eq!(backend.detailed_calls(), 1);
    }

    #[tokio::test]
    async fn test_both_tiers_failing_records_secondary_error() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "One Piece", &["Nami"]);
        store.insert(anime.clone());

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Err("primary down".to_string()));
        backend.set_detailed(Err("secondary down".to_string()));

        let orch = orchestrator(store.clone(), backend.clone(), Arc::new(MemoryTtlStore::new()));
        let outcome = orch.enrich_one(&anime, &anime.characters[0]).await;

        assert_eq!(outcome, EnrichOutcome::Failed);
        let stored = store.character(1, &anime.characters[0].key).unwrap();
        assert_eq!(stored.enrichment.status, EnrichmentStatus::Failed);
        assert!(stored
            .enrichment
            .last_error
            .unwrap()
            .contains("secondary down"));
    }

    #[tokio::test]
    async fn test_store_outage_during_pending_persist_is_failed_not_skipped() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "One Piece", &["Brook"]);
        store.insert(anime.clone());
        store.fail_update(1);

        let backend = Arc::new(MockProfileBackend::new());
        let orch = orchestrator(store.clone(), backend.clone(), Arc::new(MemoryTtlStore::new()));

        let outcome = orch.enrich_one(&anime, &anime.characters[0]).await;
        assert_eq!(outcome, EnrichOutcome::Failed);
        assert_eq!(backend.comprehensive_calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_hit_short_circuits_backends() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "One Piece", &["Nami"]);
        store.insert(anime.clone());
        let key = anime.characters[0].key.clone();

        let ttl = Arc::new(MemoryTtlStore::new());
        let backend = Arc::new(MockProfileBackend::new());
        let orch = orchestrator(store.clone(), backend.clone(), ttl);

        let cache_key = profile_cache_key(1, &key);
        orch.cache()
            .set(&cache_key, &test_profile("navigator"))
            .await
            .unwrap();

        let outcome = orch.enrich_one(&anime, &anime.characters[0]).await;
        assert_eq!(outcome, EnrichOutcome::Success);
        assert_eq!(backend.comprehensive_calls(), 0);
        assert_eq!(backend.detailed_calls(), 0);

        let stored = store.character(1, &key).unwrap();
        assert_eq!(stored.enrichment.status, EnrichmentStatus::Success);
        assert_eq!(
            stored.enrichment.profile.unwrap().personality_analysis,
            "navigator"
        );
    }

    #[tokio::test]
    async fn test_held_lock_yields_in_progress() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "One Piece", &["Usopp"]);
        store.insert(anime.clone());
        let key = anime.characters[0].key.clone();

        let ttl = Arc::new(MemoryTtlStore::new());
        // Simulate a concurrent orchestration holding the lock.
        ttl.put_if_absent(
            &enrich_lock_key(1, &key),
            "held",
            std::time::Duration::from_secs(120),
        )
        .await
        .unwrap();

        let backend = Arc::new(MockProfileBackend::new());
        let orch = orchestrator(store.clone(), backend.clone(), ttl);

        let outcome = orch.enrich_one(&anime, &anime.characters[0]).await;
        assert_eq!(outcome, EnrichOutcome::InProgress);
        assert_eq!(backend.comprehensive_calls(), 0);
    }

    #[tokio::test]
    async fn test_lock_released_after_failure() {
        let store = Arc::new(MockAnimeStore::new());
        let anime = test_anime(1, "One Piece", &["Sanji"]);
        store.insert(anime.clone());

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Err("down".to_string()));
        backend.set_detailed(Err("down".to_string()));

        let ttl = Arc::new(MemoryTtlStore::new());
        let orch = orchestrator(store.clone(), backend.clone(), ttl.clone());

        orch.enrich_one(&anime, &anime.characters[0]).await;
        // The lock must be free again after the failed run.
        let lock_key = enrich_lock_key(1, &anime.characters[0].key);
        assert!(ttl
            .put_if_absent(&lock_key, "x", std::time::Duration::from_secs(1))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_on_demand_second_call_served_from_cache() {
        let store = Arc::new(MockAnimeStore::new());
        store.insert(test_anime(1, "Naruto", &["Naruto Uzumaki"]));

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("ninja")));

        let orch = orchestrator(store.clone(), backend.clone(), Arc::new(MemoryTtlStore::new()));

        let first = orch.enrich_on_demand(1, "Naruto Uzumaki", false).await;
        assert_eq!(first.status, OnDemandStatus::Success);
        assert!(first.triggered);
        assert_eq!(backend.comprehensive_calls(), 1);

        let second = orch.enrich_on_demand(1, "Naruto Uzumaki", false).await;
        assert_eq!(second.status, OnDemandStatus::Success);
        assert!(second.from_cache);
        assert!(!second.triggered);
        // No additional backend call.
        assert_eq!(backend.comprehensive_calls(), 1);
    }

    #[tokio::test]
    async fn test_on_demand_force_refresh_calls_backend_again() {
        let store = Arc::new(MockAnimeStore::new());
        store.insert(test_anime(1, "Naruto", &["Naruto Uzumaki"]));

        let backend = Arc::new(MockProfileBackend::new());
        backend.set_comprehensive(Ok(test_profile("ninja")));

        let orch = orchestrator(store.clone(), backend.clone(), Arc::new(MemoryTtlStore::new()));

        orch.enrich_on_demand(1, "Naruto Uzumaki", false).await;
        let refreshed = orch.enrich_on_demand(1, "Naruto Uzumaki", true).await;

        assert_eq!(refreshed.status, OnDemandStatus::Success);
        assert!(refreshed.triggered);
        assert_eq!(backend.comprehensive_calls(), 2);
    }

    #[tokio::test]
    async fn test_on_demand_unknown_targets_report_not_found() {
        let store = Arc::new(MockAnimeStore::new());
        store.insert(test_anime(1, "Naruto", &["Naruto Uzumaki"]));

        let backend = Arc::new(MockProfileBackend::new());
        let orch = orchestrator(store, backend, Arc::new(MemoryTtlStore::new()));

        let missing_anime = orch.enrich_on_demand(99, "Naruto Uzumaki", false).await;
        assert_eq!(missing_anime.status, OnDemandStatus::NotFound);

        let missing_character = orch.enrich_on_demand(1, "Sasuke Uchiha", false).await;
        assert_eq!(missing_character.status, OnDemandStatus::NotFound);
    }
}
