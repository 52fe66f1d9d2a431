pub mod sounds;
pub mod upload;

pub use sounds::sound_routes;
pub use upload::upload_routes;

use crate::config::Config;
use crate::frontend;
use crate::services::{OutputSlot, PlaybackController, SpeechController, UploadHandler};
use axum::{routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub struct AppState {
    pub title: String,
    pub library_root: PathBuf,
    pub max_upload_bytes: usize,
    pub playback: PlaybackController,
    pub speech: SpeechController,
    pub uploads: UploadHandler,
}

impl AppState {
    pub fn new(config: &Config, slot: Arc<OutputSlot>) -> Self {
        let root = config.app.sound_dir.clone();
        Self {
            title: config.app.title.clone(),
            library_root: root.clone(),
            max_upload_bytes: config.app.max_upload_bytes,
            playback: PlaybackController::new(root.clone(), slot.clone()),
            speech: SpeechController::new(slot),
            uploads: UploadHandler::new(root),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(frontend::index))
        .merge(sound_routes())
        .merge(upload_routes(state.max_upload_bytes))
        // Static assets for the page
        .fallback(get(frontend::serve_frontend))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}
