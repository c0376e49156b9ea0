use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request body for both generation tiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub character_name: String,
    pub anime_title: String,
    /// Base biographical fields already known for the character
    /// (role, description, ...), passed through as generation hints.
    #[serde(default)]
    pub known_fields: BTreeMap<String, String>,
    /// Caller-supplied token so a duplicated call is deduplicated upstream.
    pub idempotency_token: String,
}

/// Structured payload returned by the generation service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub personality_analysis: String,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub notable_quotes: Vec<String>,
}

impl GenerationResponse {
    /// A payload without at least a personality analysis cannot be merged
    /// into a character record.
    pub fn is_usable(&self) -> bool {
        !self.personality_analysis.trim().is_empty()
    }
}
