//! Error types for the RAG pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Chunking exceeded the per-document chunk limit
    #[error("Chunking produced more than {limit} chunks for '{doc_name}'")]
    ChunkExplosion { doc_name: String, limit: usize },

    /// Document normalized to empty text, nothing to ingest
    #[error("Document '{0}' contains no indexable text")]
    EmptyDocument(String),

    /// Upsert received a chunk without an embedding
    #[error("Invalid chunk: {0}")]
    InvalidChunk(String),

    /// An upstream call exceeded its deadline
    #[error("Upstream {operation} timed out after {timeout_secs}s")]
    UpstreamTimeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    /// Transient model backend failure
    #[error("Model backend error: {0}")]
    UpstreamModel(String),

    /// Non-retriable model failure (auth or response shape)
    #[error("Model backend rejected the request: {0}")]
    UpstreamModelInvalid(String),

    /// Transient vector backend failure
    #[error("Vector backend error: {0}")]
    UpstreamVector(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid-input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a transient model error
    pub fn model(message: impl Into<String>) -> Self {
        Self::UpstreamModel(message.into())
    }

    /// Create a non-retriable model error
    pub fn model_invalid(message: impl Into<String>) -> Self {
        Self::UpstreamModelInvalid(message.into())
    }

    /// Create a vector backend error
    pub fn vector(message: impl Into<String>) -> Self {
        Self::UpstreamVector(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::EmptyDocument(_) => (StatusCode::BAD_REQUEST, "empty_document"),
            Error::ChunkExplosion { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "chunk_explosion")
            }
            Error::InvalidChunk(_) => (StatusCode::INTERNAL_SERVER_ERROR, "invalid_chunk"),
            Error::UpstreamTimeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout"),
            Error::UpstreamModel(_) => (StatusCode::BAD_GATEWAY, "model_error"),
            Error::UpstreamModelInvalid(_) => (StatusCode::BAD_GATEWAY, "model_invalid"),
            Error::UpstreamVector(_) => (StatusCode::BAD_GATEWAY, "vector_error"),
            Error::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
