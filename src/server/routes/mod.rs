//! API route handlers

pub mod ask;
pub mod ingest;
pub mod sources;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Build the `/api` route tree
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/ingest/text", post(ingest::ingest_text))
        .route("/ingest/files", post(ingest::ingest_files))
        .route("/ingest/samples", post(ingest::ingest_samples))
        .route("/ask", post(ask::ask))
        .route("/sources", get(sources::list_sources))
        .route("/sources/:id", get(sources::get_source))
        .layer(DefaultBodyLimit::max(max_upload_size))
}
