//! Mock implementations of the pipeline trait seams.
//!
//! Used by the unit tests in this crate to script store and backend
//! behavior and to verify call counts.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use domain::{AnimeRecord, CharacterPatch, CharacterProfile, CharacterRecord};

use crate::error::EnrichmentError;
use crate::traits::{AnimeStore, ProfileBackend, ProfileRequest};

/// In-memory [`AnimeStore`] over a mutex-guarded map.
#[derive(Default)]
pub struct MockAnimeStore {
    data: Mutex<HashMap<i64, AnimeRecord>>,
    failing: Mutex<HashSet<i64>>,
    failing_updates: Mutex<HashSet<i64>>,
}

impl MockAnimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, anime: AnimeRecord) {
        self.data.lock().insert(anime.id, anime);
    }

    /// Make `get_anime` fail for one id, to exercise error isolation.
    pub fn fail_get(&self, anime_id: i64) {
        self.failing.lock().insert(anime_id);
    }

    /// Make `update_character` fail for one anime, to exercise store
    /// outages mid-orchestration.
    pub fn fail_update(&self, anime_id: i64) {
        self.failing_updates.lock().insert(anime_id);
    }

    /// Fetch one stored character for verification.
    pub fn character(&self, anime_id: i64, key: &str) -> Option<CharacterRecord> {
        self.data
            .lock()
            .get(&anime_id)
            .and_then(|a| a.characters.iter().find(|c| c.key == key).cloned())
    }
}

#[async_trait]
impl AnimeStore for MockAnimeStore {
    async fn get_anime(&self, id: i64) -> Result<Option<AnimeRecord>, EnrichmentError> {
        if self.failing.lock().contains(&id) {
            return Err(EnrichmentError::Store(format!("injected failure for {}", id)));
        }
        Ok(self.data.lock().get(&id).cloned())
    }

    async fn list_anime_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<AnimeRecord>, EnrichmentError> {
        let data = self.data.lock();
        let mut all: Vec<_> = data.values().cloned().collect();
        all.sort_by_key(|a| a.id);
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update_character(
        &self,
        anime_id: i64,
        character_key: &str,
        patch: CharacterPatch,
    ) -> Result<bool, EnrichmentError> {
        if self.failing_updates.lock().contains(&anime_id) {
            return Err(EnrichmentError::Store(format!(
                "injected update failure for {}",
                anime_id
            )));
        }
        let mut data = self.data.lock();
        let Some(anime) = data.get_mut(&anime_id) else {
            return Ok(false);
        };
        let Some(character) = anime
            .characters
            .iter_mut()
            .find(|c| c.key == character_key)
        else {
            return Ok(false);
        };
        patch.apply(character);
        anime.updated_at = Utc::now();
        Ok(true)
    }
}

/// Scripted [`ProfileBackend`] with per-tier results and call counters.
pub struct MockProfileBackend {
    comprehensive: Mutex<Result<CharacterProfile, String>>,
    detailed: Mutex<Result<CharacterProfile, String>>,
    comprehensive_calls: AtomicUsize,
    detailed_calls: AtomicUsize,
}

impl Default for MockProfileBackend {
    fn default() -> Self {
        Self {
            comprehensive: Mutex::new(Err("comprehensive tier not scripted".to_string())),
            detailed: Mutex::new(Err("detailed tier not scripted".to_string())),
            comprehensive_calls: AtomicUsize::new(0),
            detailed_calls: AtomicUsize::new(0),
        }
    }
}

impl MockProfileBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_comprehensive(&self, result: Result<CharacterProfile, String>) {
        *self.comprehensive.lock() = result;
    }

    pub fn set_detailed(&self, result: Result<CharacterProfile, String>) {
        *self.detailed.lock() = result;
    }

    pub fn comprehensive_calls(&self) -> usize {
        self.comprehensive_calls.load(Ordering::SeqCst)
    }

    pub fn detailed_calls(&self) -> usize {
        self.detailed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileBackend for MockProfileBackend {
    async fn comprehensive(
        &self,
        _request: &ProfileRequest,
    ) -> Result<CharacterProfile, EnrichmentError> {
        self.comprehensive_calls.fetch_add(1, Ordering::SeqCst);
        self.comprehensive
            .lock()
            .clone()
            .map_err(EnrichmentError::Backend)
    }

    async fn detailed(
        &self,
        _request: &ProfileRequest,
    ) -> Result<CharacterProfile, EnrichmentError> {
        self.detailed_calls.fetch_add(1, Ordering::SeqCst);
        self.detailed.lock().clone().map_err(EnrichmentError::Backend)
    }
}

/// Build an anime record with character stubs for tests.
pub fn test_anime(id: i64, title: &str, character_names: &[&str]) -> AnimeRecord {
    let source_id = format!("src-{}", id);
    let characters = character_names
        .iter()
        .map(|name| CharacterRecord::new(&source_id, *name))
        .collect();
    AnimeRecord {
        id,
        source_id,
        title: title.to_string(),
        characters,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Build a minimal usable profile payload for tests.
pub fn test_profile(analysis: &str) -> CharacterProfile {
    CharacterProfile {
        personality_analysis: analysis.to_string(),
        abilities: vec!["test ability".to_string()],
        ..Default::default()
    }
}
