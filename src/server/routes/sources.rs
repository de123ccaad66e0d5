//! Source listing endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::response::SourceDetailResponse;
use crate::types::Document;

/// GET /api/sources - list ingested documents
pub async fn list_sources(State(state): State<AppState>) -> Result<Json<Vec<Document>>> {
    let documents = state.index().list_documents().await?;
    Ok(Json(documents))
}

/// GET /api/sources/{id} - one document with its chunks
pub async fn get_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SourceDetailResponse>> {
    let document = state
        .index()
        .get_document(id)
        .await?
        .ok_or(Error::DocumentNotFound(id))?;

    let chunks = state.index().get_document_chunks(id).await?;

    Ok(Json(SourceDetailResponse { document, chunks }))
}
