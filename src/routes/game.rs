// src/routes/game.rs
use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::{
    error::AppError,
    message::{
        AskSuspectRequest, AskSuspectResponse, AvatarRequest, AvatarResponse, GameResponse,
        NarratorRequest, NarratorResponse,
    },
    state::SharedState,
};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[instrument(skip(state), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn start_game_handler(
    State(state): State<SharedState>,
) -> Result<Json<GameResponse>, AppError> {
    let data = state.game_master.start_game().await?;
    Ok(Json(GameResponse { data }))
}

#[instrument(skip(state, payload), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn ask_suspect_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AskSuspectRequest>,
) -> Result<Json<AskSuspectResponse>, AppError> {
    let answer = state.game_master.interrogate(&payload).await?;
    Ok(Json(AskSuspectResponse { answer }))
}

#[instrument(skip(state, payload), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn ask_narrator_handler(
    State(state): State<SharedState>,
    Json(payload): Json<NarratorRequest>,
) -> Result<Json<NarratorResponse>, AppError> {
    let response = state.game_master.narrate(&payload).await?;
    Ok(Json(response))
}

#[instrument(skip(state, payload), fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn generate_pfp_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AvatarRequest>,
) -> Result<Json<AvatarResponse>, AppError> {
    let image = state.avatars.generate(&payload.description).await?;
    Ok(Json(AvatarResponse { image }))
}
