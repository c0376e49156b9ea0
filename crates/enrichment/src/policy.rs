use std::time::Duration;

/// Retry and pacing configuration for the enrichment pipeline.
///
/// Injected into the orchestrator, scheduler and locator rather than
/// hard-coded, so deployments and tests can override any knob.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum automatic attempts before a failed character is parked.
    pub max_attempts: u32,
    /// Minimum wait after a failed attempt before a retry is eligible.
    pub cooldown: Duration,
    /// TTL of the per-character orchestration lock.
    pub lock_ttl: Duration,
    /// TTL of cached enrichment payloads.
    pub cache_ttl: Duration,
    /// Fixed delay between characters within one anime.
    pub inter_item_delay: Duration,
    /// Fixed delay between anime within one batch.
    pub inter_anime_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown: Duration::from_secs(24 * 60 * 60),
            lock_ttl: Duration::from_secs(2 * 60),
            cache_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            inter_item_delay: Duration::from_secs(2),
            inter_anime_delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// Policy with zero pacing delays, for tests.
    pub fn immediate() -> Self {
        Self {
            inter_item_delay: Duration::ZERO,
            inter_anime_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
