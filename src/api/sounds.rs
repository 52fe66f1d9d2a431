use crate::api::AppState;
use crate::error::Result;
use crate::models::{PlayRequest, PlayResponse, SpeakRequest, SpeakResponse, StopResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

pub fn sound_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/play", post(play_sound))
        .route("/stop", post(stop_sound))
        .route("/speak", post(speak_text))
}

async fn play_sound(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PlayRequest>, JsonRejection>,
) -> Result<Json<PlayResponse>> {
    let Json(req) = payload?;
    let target = req.sound_file.unwrap_or_default();

    let outcome = state.playback.play(&target).await?;
    Ok(Json(outcome.into()))
}

async fn stop_sound(State(state): State<Arc<AppState>>) -> Result<Json<StopResponse>> {
    state.playback.stop().await?;
    Ok(Json(StopResponse {
        status: "stopped sound",
    }))
}

/// Blocks until the whole utterance has been spoken.
async fn speak_text(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SpeakRequest>, JsonRejection>,
) -> Result<Json<SpeakResponse>> {
    let Json(req) = payload?;
    let text = req.text.unwrap_or_default();

    let text = state.speech.speak(&text).await?;
    Ok(Json(SpeakResponse {
        status: "speaking",
        text,
    }))
}
