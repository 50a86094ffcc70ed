// Router assembly for the HTTP surface.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::Level;

use crate::config::ServiceConfig;
use crate::handlers;
use crate::remover::BackgroundRemover;

// Maximum allowed size for upload request bodies
pub const MAX_UPLOAD_SIZE_BYTES: usize = 100 * 1024 * 1024; // 100MB

pub type SharedRemover = Arc<dyn BackgroundRemover>;

/// Everything the handlers need, injected at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub remover: SharedRemover,
}

pub fn create_app(config: ServiceConfig, remover: SharedRemover) -> Router {
    let state = AppState {
        config: Arc::new(config),
        remover,
    };

    Router::new()
        // Documentation page with the interactive upload form
        .route("/", get(handlers::index))
        // Liveness probe
        .route("/health", get(handlers::health))
        // The one functional endpoint
        .route("/remove-bg", post(handlers::remove_background))
        // Apply a layer to limit the maximum size of request bodies
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        // Add CORS layer for broader client compatibility
        .layer(CorsLayer::permissive())
        // Add tracing for HTTP requests and responses
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        .with_state(state)
}
