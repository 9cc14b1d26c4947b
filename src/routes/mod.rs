// src/routes/mod.rs
pub mod game;

use anyhow::Context;
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use game::{
    ask_narrator_handler, ask_suspect_handler, generate_pfp_handler, health_handler,
    start_game_handler,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn create_router() -> Router<SharedState> {
    Router::new()
        .route("/start_game", post(start_game_handler))
        .route("/ask", post(ask_suspect_handler))
        .route("/ask/narrator", post(ask_narrator_handler))
        .route("/generate_pfp", post(generate_pfp_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
}

/// CORS policy for the browser frontend. An empty allow-list is permissive.
pub fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    if allowed_origins.is_empty() {
        return Ok(CorsLayer::very_permissive());
    }
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("invalid CORS origin: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any))
}
