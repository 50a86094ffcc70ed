// Handler functions for each endpoint.

use axum::{
    Json,
    extract::{Multipart, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use std::io::Write;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extract_upload::extract_upload;
use crate::image_codec::{decode_upload, encode_png};
use crate::models::HealthStatus;

const INDEX_HTML: &str = include_str!("../static/index.html");

// --- GET / ---
// Static documentation page with an interactive upload form.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// --- GET /health ---
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::healthy())
}

// --- POST /remove-bg ---
// Validates the upload, runs decode -> remove -> encode on a blocking worker,
// and streams the PNG back as an attachment under a fresh random name.
pub async fn remove_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = extract_upload(multipart).await?;

    if upload.filename.is_empty() {
        return Err(ApiError::EmptyFilename);
    }
    if !state.config.allows_file(&upload.filename) {
        return Err(ApiError::DisallowedExtension);
    }

    let request_id = Uuid::new_v4();
    info!(
        "Background removal request {}: {:?}, {} bytes, remover '{}'",
        request_id,
        upload.filename,
        upload.data.len(),
        state.remover.name()
    );

    let remover = state.remover.clone();
    let upload_dir = state.config.upload_dir.clone();

    let png_bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ApiError> {
        let input = decode_upload(&upload.data)?;
        let output = remover.remove(&input)?;
        let encoded = encode_png(&output)?;
        spool_through_temp_file(&upload_dir, &encoded)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Image processing task failed: {}", e)))??;

    info!(
        "Background removal request {} completed, {} bytes of PNG",
        request_id,
        png_bytes.len()
    );

    let headers = [
        (header::CONTENT_TYPE, mime::IMAGE_PNG.as_ref().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.png\"", request_id),
        ),
    ];
    Ok((headers, png_bytes).into_response())
}

// Writes the encoded result to a uniquely named temp file in the upload
// directory and reads it back for the response. The file is owned by `temp`
// and removed when it drops, on success and failure alike.
fn spool_through_temp_file(upload_dir: &Path, encoded: &[u8]) -> Result<Vec<u8>, ApiError> {
    std::fs::create_dir_all(upload_dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix("rembg-")
        .suffix(".png")
        .tempfile_in(upload_dir)?;
    temp.write_all(encoded)?;
    temp.flush()?;

    let bytes = std::fs::read(temp.path())?;
    Ok(bytes)
}
