//! Resolved configuration for the RAG pipeline
//!
//! Configuration loading and secret resolution happen outside the core; these
//! structs are the resolved settings handed to it. `from_env` is a thin
//! overlay for the values that are secrets in practice.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main RAG configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Ingest batching and file limits
    pub ingest: IngestConfig,
    /// Ask pipeline configuration
    pub ask: AskConfig,
    /// Model provider selection and credentials
    pub model: ModelConfig,
    /// Vector backend selection
    pub vector: VectorConfig,
    /// Upstream call deadlines
    pub timeouts: TimeoutConfig,
}

impl RagConfig {
    /// Default configuration with secrets overlaid from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.model.api_key = std::env::var("RAG_MODEL_API_KEY").ok();
        if let Ok(url) = std::env::var("RAG_MODEL_BASE_URL") {
            config.model.base_url = Some(url);
        }
        if let Ok(url) = std::env::var("RAG_QDRANT_URL") {
            config.vector.url = url;
        }
        config
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 32 * 1024 * 1024,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub overlap: usize,
    /// Hard cap on chunks produced from a single document
    pub max_chunks_per_document: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 150,
            max_chunks_per_document: 5000,
        }
    }
}

/// Ingest batching and file handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Chunks per embedding batch
    pub embedding_batch_size: usize,
    /// Chunks per vector store upsert batch
    pub vector_store_batch_size: usize,
    /// Per-file size limit for file ingest
    pub max_file_size_bytes: u64,
    /// Folder scanned by the samples ingest endpoint
    pub samples_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            embedding_batch_size: 100,
            vector_store_batch_size: 50,
            max_file_size_bytes: 10 * 1024 * 1024,
            samples_dir: PathBuf::from("samples"),
        }
    }
}

/// Ask pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskConfig {
    /// Questions longer than this are truncated with a marker
    pub max_question_length: usize,
    /// Chunks retrieved when the caller does not specify topK
    pub default_top_k: usize,
    /// Optional similarity floor; results strictly below it are dropped
    pub min_similarity_score: Option<f32>,
}

impl Default for AskConfig {
    fn default() -> Self {
        Self {
            max_question_length: 2000,
            default_top_k: 5,
            min_similarity_score: None,
        }
    }
}

/// Model provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider tag for chat (and embeddings unless overridden)
    pub provider: crate::providers::ModelProviderKind,
    /// Optional separate provider tag for embeddings
    pub embedding_provider: Option<crate::providers::ModelProviderKind>,
    /// Chat model name
    pub chat_model: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Embedding vector dimension
    pub dimension: usize,
    /// API key, resolved by the caller
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL override (Azure resource endpoint, proxies, self-hosted)
    pub base_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: crate::providers::ModelProviderKind::OpenAi,
            embedding_provider: None,
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            api_key: None,
            base_url: None,
        }
    }
}

/// Vector backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// Backend tag
    pub backend: crate::providers::VectorBackendKind,
    /// Backend endpoint URL (ignored by the in-memory backend)
    pub url: String,
    /// Collection / index name
    pub collection: String,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: crate::providers::VectorBackendKind::Memory,
            url: "http://localhost:6333".to_string(),
            collection: "runbook_chunks".to_string(),
        }
    }
}

/// Upstream call deadlines in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Embedding calls
    pub embed_timeout_secs: u64,
    /// Chat completion calls
    pub chat_timeout_secs: u64,
    /// Vector store calls
    pub vector_timeout_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embed_timeout_secs: 300,
            chat_timeout_secs: 120,
            vector_timeout_secs: 120,
        }
    }
}
