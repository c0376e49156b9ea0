use serde::{Deserialize, Serialize};
use std::time::Duration;

use enrichment::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub gentext_base_url: String,
    pub gentext_api_key: String,
    /// Token required by destructive admin endpoints. Admin operations are
    /// rejected when unset.
    pub admin_token: Option<String>,
    /// Anime per scheduled batch run.
    pub batch_anime_size: u32,
    /// Characters enriched per anime in a scheduled run.
    pub batch_characters_per_anime: u32,
    /// Whether scheduled runs pick up failed characters past cooldown.
    pub batch_include_retries: bool,
    /// Interval between scheduled batch runs, in seconds.
    pub batch_interval_secs: u64,
    /// Interval between cache sweeps, in seconds.
    pub sweep_interval_secs: u64,
    /// Retry-policy overrides; `None` keeps the defaults.
    pub max_attempts: Option<u32>,
    pub cooldown_hours: Option<u64>,
}

impl Config {
    pub fn new(database_url: String, gentext_base_url: String, gentext_api_key: String) -> Self {
        Self {
            database_url,
            max_connections: 5,
            gentext_base_url,
            gentext_api_key,
            admin_token: None,
            batch_anime_size: 10,
            batch_characters_per_anime: 5,
            batch_include_retries: true,
            batch_interval_secs: 6 * 60 * 60,
            sweep_interval_secs: 24 * 60 * 60,
            max_attempts: None,
            cooldown_hours: None,
        }
    }

    /// Build the pipeline retry policy, applying deployment overrides.
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::default();
        if let Some(max_attempts) = self.max_attempts {
            policy.max_attempts = max_attempts;
        }
        if let Some(hours) = self.cooldown_hours {
            policy.cooldown = Duration::from_secs(hours * 60 * 60);
        }
        policy
    }
}
