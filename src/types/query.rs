//! Request types for the ask and ingest endpoints

use serde::{Deserialize, Serialize};

/// Request body for `POST /api/ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    /// The question to answer from the ingested corpus
    pub question: String,
    /// Number of chunks to retrieve; server default applies when unset
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Request body for `POST /api/ingest/text`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestTextRequest {
    /// Display name for the document
    pub doc_name: String,
    /// Raw document text
    pub text: String,
}

/// Request body for `POST /api/ingest/samples`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSamplesRequest {
    /// Folder to scan; the configured samples directory when unset
    #[serde(default)]
    pub folder_path: Option<String>,
}
