use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::UploadResponse;
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

pub fn upload_routes(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let data = field.bytes().await?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    let filename = state.uploads.store(filename.as_deref(), data).await?;
    Ok(Json(UploadResponse {
        status: "success",
        message: format!("File {} uploaded successfully", filename),
        filename,
    }))
}
