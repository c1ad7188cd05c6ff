pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod utils;

use axum::{Router, extract::DefaultBodyLimit, routing::{delete, get, post}};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{
        delete_file, download_file, get_file, get_stats, list_files, preview_file, upload_file,
    },
    state::AppState,
};

/// Build the application router. Split out of `main` so tests can drive
/// the full HTTP surface against an in-memory store.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Leave headroom above the file-size limit for multipart framing
    let body_limit = state.config.max_file_size as usize + 64 * 1024;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/upload", post(upload_file))
        .route("/api/files/{share_id}", get(get_file))
        .route("/api/files/{share_id}/download", get(download_file))
        .route("/api/files/{share_id}/preview", get(preview_file))
        .route("/api/admin/files", get(list_files))
        .route("/api/admin/files/{id}", delete(delete_file))
        .route("/api/admin/stats", get(get_stats))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
