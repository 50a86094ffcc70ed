// Error types for the HTTP surface and their conversion into responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::remover::RemovalError;

// Clients always get this body on a 500; the cause stays in the server log.
pub const GENERIC_PROCESSING_ERROR: &str = "Image processing failed";

#[derive(Debug)]
pub enum ApiError {
    // Upload validation, detected before any processing
    MissingFilePart,
    EmptyFilename,
    DisallowedExtension,
    InvalidMultipart(String),

    // Failures while turning the upload into a result image
    DecodeFailed(String),
    ProcessingFailed(String),
    EncodeFailed(String),

    // I/O around the temporary output file
    Io(std::io::Error),

    // Miscellaneous server-side failures (e.g. a worker task panicking)
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MissingFilePart
            | Self::EmptyFilename
            | Self::DisallowedExtension
            | Self::InvalidMultipart(_) => StatusCode::BAD_REQUEST,
            Self::DecodeFailed(_)
            | Self::ProcessingFailed(_)
            | Self::EncodeFailed(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            Self::MissingFilePart => "No file part in the request".to_string(),
            Self::EmptyFilename => "No file selected".to_string(),
            Self::DisallowedExtension => "File type not allowed".to_string(),
            Self::InvalidMultipart(reason) => format!("Invalid multipart request: {}", reason),

            Self::DecodeFailed(detail) => {
                tracing::error!("Image decode failed: {}", detail);
                GENERIC_PROCESSING_ERROR.to_string()
            }
            Self::ProcessingFailed(detail) => {
                tracing::error!("Background removal failed: {}", detail);
                GENERIC_PROCESSING_ERROR.to_string()
            }
            Self::EncodeFailed(detail) => {
                tracing::error!("Result encoding failed: {}", detail);
                GENERIC_PROCESSING_ERROR.to_string()
            }
            Self::Io(err) => {
                tracing::error!("I/O error while handling request: {}", err);
                GENERIC_PROCESSING_ERROR.to_string()
            }
            Self::Internal(detail) => {
                tracing::error!("Internal error while handling request: {}", detail);
                GENERIC_PROCESSING_ERROR.to_string()
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::InvalidMultipart(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<RemovalError> for ApiError {
    fn from(err: RemovalError) -> Self {
        Self::ProcessingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_keep_their_reason_strings() {
        let (status, body) = body_json(ApiError::MissingFilePart).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No file part in the request" }));

        let (status, body) = body_json(ApiError::EmptyFilename).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No file selected" }));

        let (status, body) = body_json(ApiError::DisallowedExtension).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "File type not allowed" }));
    }

    #[tokio::test]
    async fn processing_errors_hide_internal_detail() {
        let (status, body) =
            body_json(ApiError::DecodeFailed("unexpected EOF at byte 12".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": GENERIC_PROCESSING_ERROR }));

        let (status, body) =
            body_json(ApiError::ProcessingFailed("onnx session crashed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], GENERIC_PROCESSING_ERROR);
        assert!(!body["error"].as_str().unwrap().contains("onnx"));
    }
}
