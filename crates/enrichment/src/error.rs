use thiserror::Error;

/// Errors that can occur in the enrichment pipeline.
///
/// Per-character errors never escape the orchestrator; they are recorded
/// in that character's own enrichment state. Only store/infrastructure
/// failures propagate out of batch entry points.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Both backend tiers failed or returned an unusable payload.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Document or key/value store failure (abstracted).
    #[error("Store error: {0}")]
    Store(String),

    /// Anime or character not found.
    #[error("Not found: {0}")]
    NotFound(String),
}
