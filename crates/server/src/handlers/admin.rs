use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use domain::{CharacterRecord, EnrichmentStatus, ResetReport};
use enrichment::{reset_status, set_protection};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Body for an admin reset of enrichment tracking state
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetRequest {
    /// Names to reset; all characters when omitted.
    #[serde(default)]
    pub character_names: Option<Vec<String>>,
    #[serde(default)]
    pub reset_to: EnrichmentStatus,
}

/// Body for toggling manual protection on a character
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProtectRequest {
    pub character_name: String,
    pub protected: bool,
    #[serde(default)]
    pub by: Option<String>,
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(AppError::Unauthorized(
            "admin operations are disabled (no admin token configured)".to_string(),
        ));
    };

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided != expected {
        return Err(AppError::Unauthorized("invalid admin token".to_string()));
    }

    Ok(())
}

/// Reset enrichment tracking state (admin only)
///
/// Destructive to tracking fields only; previously enriched content is
/// preserved.
#[utoipa::path(
    post,
    path = "/api/anime/{id}/characters/reset",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Anime ID")
    ),
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Reset summary", body = ResetReport),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Anime not found")
    )
)]
pub async fn reset_characters(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<ResetRequest>,
) -> AppResult<Json<ResetReport>> {
    require_admin(&state, &headers)?;

    let reset_to = match payload.reset_to {
        EnrichmentStatus::Unset | EnrichmentStatus::Pending => payload.reset_to,
        other => {
            return Err(AppError::Validation(format!(
                "cannot reset to '{}'",
                other.as_str()
            )))
        }
    };

    let report = reset_status(
        state.store.as_ref(),
        id,
        payload.character_names.as_deref(),
        reset_to,
    )
    .await?;

    Ok(Json(report))
}

/// Toggle manual protection for a character (admin only)
#[utoipa::path(
    post,
    path = "/api/anime/{id}/characters/protect",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Anime ID")
    ),
    request_body = ProtectRequest,
    responses(
        (status = 200, description = "Updated character", body = CharacterRecord),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 404, description = "Anime or character not found")
    )
)]
pub async fn protect_character(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<ProtectRequest>,
) -> AppResult<Json<CharacterRecord>> {
    require_admin(&state, &headers)?;

    let updated = set_protection(
        state.store.as_ref(),
        id,
        &payload.character_name,
        payload.protected,
        payload.by,
    )
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "character '{}' in anime {}",
            payload.character_name, id
        ))
    })?;

    Ok(Json(updated))
}
