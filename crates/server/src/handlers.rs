pub mod admin;
pub mod anime;
pub mod enrichment;

pub use admin::{protect_character, reset_characters, ProtectRequest, ResetRequest};
pub use anime::{create_anime, get_anime};
pub use enrichment::{
    enrich_anime, enrich_batch, enrich_character, get_eligible, BatchRequest, EligibleQuery,
    EnrichAnimeRequest, OnDemandRequest,
};
