//! Ingest endpoints

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::ingestion::Ingestor;
use crate::server::state::AppState;
use crate::types::query::{IngestSamplesRequest, IngestTextRequest};
use crate::types::response::{
    IngestFileResult, IngestFilesResponse, IngestSamplesResponse, IngestTextResponse,
};

/// POST /api/ingest/text - ingest a single document from raw text
pub async fn ingest_text(
    State(state): State<AppState>,
    Json(request): Json<IngestTextRequest>,
) -> Result<Json<IngestTextResponse>> {
    if request.text.trim().is_empty() {
        return Err(Error::invalid_input("text must not be blank"));
    }

    let doc = state
        .ingestor()
        .ingest_text(&request.doc_name, &request.text, None)
        .await?;

    Ok(Json(IngestTextResponse::from(&doc)))
}

/// POST /api/ingest/files - ingest uploaded files
///
/// Files that are oversized, of a disallowed extension, or not valid UTF-8
/// are reported per-file and skipped; the request as a whole succeeds.
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestFilesResponse>> {
    let mut results = Vec::new();
    let max_size = state.ingestor().max_file_size_bytes();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("failed to read multipart field: {e}")))?
    {
        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                results.push(skipped(&file_name, format!("failed to read upload: {e}")));
                continue;
            }
        };

        if data.len() as u64 > max_size {
            results.push(skipped(
                &file_name,
                format!("file exceeds {max_size} bytes"),
            ));
            continue;
        }
        if !Ingestor::is_allowed_file(&file_name) {
            results.push(skipped(&file_name, "unsupported file extension".to_string()));
            continue;
        }

        let text = match String::from_utf8(data.to_vec()) {
            Ok(text) => text,
            Err(_) => {
                results.push(skipped(&file_name, "file is not valid UTF-8".to_string()));
                continue;
            }
        };

        match state.ingestor().ingest_text(&file_name, &text, None).await {
            Ok(doc) => results.push(IngestFileResult {
                file_name,
                document_id: Some(doc.id),
                chunk_count: doc.chunk_count,
                error: None,
            }),
            Err(e) => results.push(skipped(&file_name, e.to_string())),
        }
    }

    Ok(Json(IngestFilesResponse { results }))
}

/// POST /api/ingest/samples - ingest every allowed file under a folder
pub async fn ingest_samples(
    State(state): State<AppState>,
    Json(request): Json<IngestSamplesRequest>,
) -> Result<Json<IngestSamplesResponse>> {
    let folder = request
        .folder_path
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config().ingest.samples_dir.clone());

    let mut read_dir = tokio::fs::read_dir(&folder)
        .await
        .map_err(|_| Error::invalid_input(format!("folder not found: {}", folder.display())))?;

    let mut paths = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| Error::invalid_input(format!("failed to scan folder: {e}")))?
    {
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let documents = state.ingestor().ingest_files(&paths).await?;

    Ok(Json(IngestSamplesResponse {
        ingested: documents.len(),
        documents,
    }))
}

fn skipped(file_name: &str, error: String) -> IngestFileResult {
    tracing::warn!(file = %file_name, error = %error, "skipping upload");
    IngestFileResult {
        file_name: file_name.to_string(),
        document_id: None,
        chunk_count: 0,
        error: Some(error),
    }
}
