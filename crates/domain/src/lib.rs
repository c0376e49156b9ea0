mod anime;
mod patch;
mod report;

pub use anime::{
    character_key, AnimeRecord, CharacterProfile, CharacterRecord, EnrichmentState,
    EnrichmentStatus, ManualProtection,
};
pub use patch::{CharacterPatch, Clearable};
pub use report::{BatchReport, EnrichOutcome, OnDemandReport, OnDemandStatus, ResetReport};
