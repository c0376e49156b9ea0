use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use domain::AnimeRecord;

use crate::error::{AppError, AppResult};
use crate::repositories::{AnimeRepository, CreateAnime};
use crate::state::AppState;

/// Ingest a new anime with its character stubs
#[utoipa::path(
    post,
    path = "/api/anime",
    tag = "anime",
    request_body = CreateAnime,
    responses(
        (status = 201, description = "Anime created successfully", body = AnimeRecord),
        (status = 400, description = "Invalid payload"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_anime(
    State(state): State<AppState>,
    Json(payload): Json<CreateAnime>,
) -> AppResult<(StatusCode, Json<AnimeRecord>)> {
    if payload.source_id.trim().is_empty() {
        return Err(AppError::Validation("source_id must not be empty".to_string()));
    }
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }

    let anime = AnimeRepository::create(&state.db, payload).await?;
    tracing::info!(
        "Ingested anime {} ('{}') with {} character(s)",
        anime.id,
        anime.title,
        anime.characters.len()
    );

    Ok((StatusCode::CREATED, Json(anime)))
}

/// Get an anime by ID
#[utoipa::path(
    get,
    path = "/api/anime/{id}",
    tag = "anime",
    params(
        ("id" = i64, Path, description = "Anime ID")
    ),
    responses(
        (status = 200, description = "Anime found", body = AnimeRecord),
        (status = 404, description = "Anime not found")
    )
)]
pub async fn get_anime(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AnimeRecord>> {
    let anime = AnimeRepository::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("anime {}", id)))?;

    Ok(Json(anime))
}
