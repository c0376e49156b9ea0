//! Character-enrichment pipeline.
//!
//! Augments character stubs embedded in anime records with generated
//! biographical content from a two-tier external backend, with
//! at-most-one in-flight enrichment per character, bounded retries with
//! cooldown, idempotent caching, and per-item failure isolation across
//! batches.

mod adapters;
mod admin;
mod batch;
mod cache;
mod error;
mod guard;
mod locator;
mod matcher;
mod memory;
pub mod mocks;
mod orchestrator;
mod policy;
mod traits;

pub use adapters::GentextBackend;
pub use admin::{reset_status, select_eligible_for, set_protection};
pub use batch::BatchScheduler;
pub use cache::{profile_cache_key, ProfileCache};
pub use error::EnrichmentError;
pub use guard::{enrich_lock_key, ConcurrencyGuard};
pub use locator::select_eligible;
pub use matcher::{locate_character, normalize_name};
pub use memory::MemoryTtlStore;
pub use orchestrator::EnrichmentOrchestrator;
pub use policy::RetryPolicy;
pub use traits::{AnimeStore, ProfileBackend, ProfileRequest, TtlStore};

pub type Result<T> = std::result::Result<T, EnrichmentError>;
