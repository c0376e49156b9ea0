//! Trait abstractions for the enrichment pipeline.
//!
//! These seams allow mocking the document store, the generation backend
//! and the TTL key/value store in tests, and keep the pipeline decoupled
//! from SQLite and HTTP specifics.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

use domain::{AnimeRecord, CharacterPatch, CharacterProfile};

use crate::error::EnrichmentError;

/// Document-store access for anime records and their embedded characters.
#[async_trait]
pub trait AnimeStore: Send + Sync {
    /// Get one anime with its embedded character array.
    async fn get_anime(&self, id: i64) -> Result<Option<AnimeRecord>, EnrichmentError>;

    /// Fetch one page of anime, ordered by id.
    async fn list_anime_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<AnimeRecord>, EnrichmentError>;

    /// Atomically patch one embedded character, addressed by its stable key.
    ///
    /// Returns `false` when the anime or the character no longer exists;
    /// callers treat that as a logged no-op, since the array may have
    /// changed while an async backend call was in flight.
    async fn update_character(
        &self,
        anime_id: i64,
        character_key: &str,
        patch: CharacterPatch,
    ) -> Result<bool, EnrichmentError>;
}

/// Inputs for one generation call, identical for both tiers.
#[derive(Debug, Clone)]
pub struct ProfileRequest {
    pub character_name: String,
    pub anime_title: String,
    pub known_fields: BTreeMap<String, String>,
    pub idempotency_token: String,
}

/// Two-tier external text-generation backend.
#[async_trait]
pub trait ProfileBackend: Send + Sync {
    /// Primary, richer tier.
    async fn comprehensive(
        &self,
        request: &ProfileRequest,
    ) -> Result<CharacterProfile, EnrichmentError>;

    /// Fallback, simpler tier.
    async fn detailed(
        &self,
        request: &ProfileRequest,
    ) -> Result<CharacterProfile, EnrichmentError>;
}

/// TTL key/value store backing the profile cache and the orchestration
/// locks.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Get a live value; expired entries read as absent even if still
    /// physically present until swept.
    async fn get(&self, key: &str) -> Result<Option<String>, EnrichmentError>;

    /// Insert or replace a value with the given TTL.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EnrichmentError>;

    /// Atomically insert a value only if no live entry exists for the key.
    /// Returns `true` when the insert won.
    async fn put_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, EnrichmentError>;

    /// Remove an entry regardless of expiry.
    async fn delete(&self, key: &str) -> Result<(), EnrichmentError>;

    /// Reclaim expired entries. Space reclamation only; correctness never
    /// depends on sweeping. Returns the number of entries removed.
    async fn sweep_expired(&self) -> Result<u64, EnrichmentError>;
}
