use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use domain::{BatchReport, CharacterRecord, OnDemandReport};
use enrichment::select_eligible_for;

use crate::error::AppResult;
use crate::state::AppState;

/// Query parameters for eligibility listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct EligibleQuery {
    #[serde(default)]
    pub include_retries: bool,
}

/// Body for a per-anime enrichment run
#[derive(Debug, Deserialize, ToSchema)]
pub struct EnrichAnimeRequest {
    #[serde(default = "default_max_characters")]
    pub max_characters: u32,
    #[serde(default)]
    pub include_retries: bool,
}

fn default_max_characters() -> u32 {
    5
}

/// Body for a manually triggered batch run
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchRequest {
    #[serde(default = "default_batch_size")]
    pub anime_batch_size: u32,
    #[serde(default = "default_max_characters")]
    pub characters_per_anime: u32,
    #[serde(default)]
    pub include_retries: bool,
}

fn default_batch_size() -> u32 {
    10
}

/// Body for a user-triggered single-character enrichment
#[derive(Debug, Deserialize, ToSchema)]
pub struct OnDemandRequest {
    pub character_name: String,
    #[serde(default)]
    pub force_refresh: bool,
}

/// List the characters of an anime currently eligible for enrichment
#[utoipa::path(
    get,
    path = "/api/anime/{id}/characters/eligible",
    tag = "enrichment",
    params(
        ("id" = i64, Path, description = "Anime ID"),
        EligibleQuery
    ),
    responses(
        (status = 200, description = "Eligible characters in array order", body = Vec<CharacterRecord>),
        (status = 404, description = "Anime not found")
    )
)]
pub async fn get_eligible(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<EligibleQuery>,
) -> AppResult<Json<Vec<CharacterRecord>>> {
    let eligible = select_eligible_for(
        state.store.as_ref(),
        id,
        query.include_retries,
        &state.policy,
    )
    .await?;

    Ok(Json(eligible))
}

/// Enrich the eligible characters of one anime
#[utoipa::path(
    post,
    path = "/api/anime/{id}/enrich",
    tag = "enrichment",
    params(
        ("id" = i64, Path, description = "Anime ID")
    ),
    request_body = EnrichAnimeRequest,
    responses(
        (status = 200, description = "Aggregate outcome counters", body = BatchReport),
        (status = 404, description = "Anime not found")
    )
)]
pub async fn enrich_anime(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<EnrichAnimeRequest>,
) -> AppResult<Json<BatchReport>> {
    let report = state
        .batch
        .enrich_anime(id, payload.max_characters, payload.include_retries)
        .await?;

    Ok(Json(report))
}

/// Trigger an enrichment batch across the corpus
///
/// Manual trigger for the same code path the scheduler runs.
#[utoipa::path(
    post,
    path = "/api/enrichment/batch",
    tag = "enrichment",
    request_body = BatchRequest,
    responses(
        (status = 200, description = "Aggregate outcome counters", body = BatchReport)
    )
)]
pub async fn enrich_batch(
    State(state): State<AppState>,
    Json(payload): Json<BatchRequest>,
) -> AppResult<Json<BatchReport>> {
    let report = state
        .batch
        .run_batch(
            payload.anime_batch_size,
            payload.characters_per_anime,
            payload.include_retries,
        )
        .await?;

    Ok(Json(report))
}

/// Enrich one named character now
///
/// Always answers with a structured report; per-character failures are
/// reported in the body, not as HTTP errors.
#[utoipa::path(
    post,
    path = "/api/anime/{id}/characters/enrich",
    tag = "enrichment",
    params(
        ("id" = i64, Path, description = "Anime ID")
    ),
    request_body = OnDemandRequest,
    responses(
        (status = 200, description = "Structured enrichment report", body = OnDemandReport)
    )
)]
pub async fn enrich_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<OnDemandRequest>,
) -> Json<OnDemandReport> {
    let report = state
        .orchestrator
        .enrich_on_demand(id, &payload.character_name, payload.force_refresh)
        .await;

    Json(report)
}
