use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::anime::{
    CharacterProfile, CharacterRecord, EnrichmentStatus, ManualProtection,
};

/// Wrapper for optional fields that can be explicitly cleared.
/// - `Unchanged`: field was not provided, keep the existing value
/// - `Clear`: field was explicitly set to null, clear the value
/// - `Set(T)`: field was set to a new value
#[derive(Debug, Clone, Default)]
pub enum Clearable<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> Clearable<T> {
    pub fn resolve(self, existing: Option<T>) -> Option<T> {
        match self {
            Clearable::Unchanged => existing,
            Clearable::Clear => None,
            Clearable::Set(v) => Some(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Clearable<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Clearable::Set(v),
            None => Clearable::Clear,
        })
    }
}

/// Partial update applied to one embedded character, addressed by its
/// stable key. Unset fields preserve the existing values, so concurrent
/// patches to different fields of the same character merge instead of
/// clobbering each other.
#[derive(Debug, Clone, Default)]
pub struct CharacterPatch {
    pub status: Option<EnrichmentStatus>,
    pub attempts: Option<u32>,
    pub last_attempt_at: Clearable<DateTime<Utc>>,
    pub last_error: Clearable<String>,
    pub enriched_at: Option<DateTime<Utc>>,
    pub profile: Option<CharacterProfile>,
    pub protection: Option<ManualProtection>,
}

impl CharacterPatch {
    /// Apply this patch to a character in place.
    pub fn apply(self, character: &mut CharacterRecord) {
        let state = &mut character.enrichment;

        if let Some(status) = self.status {
            state.status = status;
        }
        if let Some(attempts) = self.attempts {
            state.attempts = attempts;
        }
        state.last_attempt_at = self.last_attempt_at.resolve(state.last_attempt_at);
        state.last_error = self.last_error.resolve(state.last_error.take());
        if let Some(enriched_at) = self.enriched_at {
            state.enriched_at = Some(enriched_at);
        }
        if let Some(profile) = self.profile {
            state.profile = Some(profile);
        }
        if let Some(protection) = self.protection {
            state.protection = protection;
        }
    }
}
