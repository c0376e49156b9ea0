use utoipa::OpenApi;

use crate::handlers;
use crate::repositories::{CreateAnime, CreateCharacter};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::anime::create_anime,
        handlers::anime::get_anime,
        handlers::enrichment::get_eligible,
        handlers::enrichment::enrich_anime,
        handlers::enrichment::enrich_batch,
        handlers::enrichment::enrich_character,
        handlers::admin::reset_characters,
        handlers::admin::protect_character,
    ),
    components(schemas(
        CreateAnime,
        CreateCharacter,
        handlers::EnrichAnimeRequest,
        handlers::BatchRequest,
        handlers::OnDemandRequest,
        handlers::ResetRequest,
        handlers::ProtectRequest,
        domain::AnimeRecord,
        domain::CharacterRecord,
        domain::CharacterProfile,
        domain::EnrichmentState,
        domain::EnrichmentStatus,
        domain::ManualProtection,
        domain::BatchReport,
        domain::EnrichOutcome,
        domain::OnDemandReport,
        domain::OnDemandStatus,
        domain::ResetReport,
    )),
    tags(
        (name = "anime", description = "Anime ingestion and lookup"),
        (name = "enrichment", description = "Character enrichment pipeline"),
        (name = "admin", description = "Admin-gated destructive operations")
    )
)]
pub struct ApiDoc;
