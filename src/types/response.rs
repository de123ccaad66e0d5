//! Response types for the ask and ingest endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{Chunk, Document};

/// A citation parsed from the model's answer
///
/// `score` stays unset: the model's citation is textual, not a retrieval
/// score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Cited document name, as emitted by the model
    pub document_name: String,
    /// Cited chunk index within the document
    pub chunk_index: u32,
    /// Snippet of the matching retrieved chunk; empty when the citation
    /// matched nothing in the retrieval set
    pub snippet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Audit-trail entry for a chunk supplied as context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedSource {
    /// Document the chunk belongs to
    pub document_name: String,
    /// Chunk position within the document
    pub chunk_index: u32,
    /// Chunk preview
    pub snippet: String,
    /// Similarity score reported by the vector backend
    pub score: f32,
}

/// Response body for `POST /api/ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    /// Model output, Markdown
    pub answer_markdown: String,
    /// Deduplicated citations in first-appearance order
    pub citations: Vec<Citation>,
    /// Chunks actually supplied as context, snippets only
    pub retrieved: Vec<RetrievedSource>,
    /// Wall-clock time spent answering
    pub elapsed_ms: u64,
    /// Token usage, when the model reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// Response body for `POST /api/ingest/text`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestTextResponse {
    pub document_id: Uuid,
    pub doc_name: String,
    pub chunk_count: u32,
    pub created_utc: DateTime<Utc>,
}

impl From<&Document> for IngestTextResponse {
    fn from(doc: &Document) -> Self {
        Self {
            document_id: doc.id,
            doc_name: doc.name.clone(),
            chunk_count: doc.chunk_count,
            created_utc: doc.created_utc,
        }
    }
}

/// Per-file outcome for `POST /api/ingest/files`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFileResult {
    /// Uploaded file name
    pub file_name: String,
    /// Set when the file was ingested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    /// Chunks created for this file
    pub chunk_count: u32,
    /// Set when the file was skipped or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response body for `POST /api/ingest/files`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFilesResponse {
    pub results: Vec<IngestFileResult>,
}

/// Response body for `POST /api/ingest/samples`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSamplesResponse {
    /// Number of documents ingested
    pub ingested: usize,
    pub documents: Vec<Document>,
}

/// Response body for `GET /api/sources/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDetailResponse {
    #[serde(flatten)]
    pub document: Document,
    /// Chunks ordered by index, without embeddings
    pub chunks: Vec<Chunk>,
}
