use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/anime", post(handlers::create_anime))
        .route("/api/anime/:id", get(handlers::get_anime))
        .route(
            "/api/anime/:id/characters/eligible",
            get(handlers::get_eligible),
        )
        .route("/api/anime/:id/enrich", post(handlers::enrich_anime))
        .route("/api/enrichment/batch", post(handlers::enrich_batch))
        .route(
            "/api/anime/:id/characters/enrich",
            post(handlers::enrich_character),
        )
        .route(
            "/api/anime/:id/characters/reset",
            post(handlers::reset_characters),
        )
        .route(
            "/api/anime/:id/characters/protect",
            post(handlers::protect_character),
        )
        .with_state(state)
}
