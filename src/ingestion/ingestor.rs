//! Chunk, embed, and upsert orchestration

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::{ChunkingConfig, IngestConfig, TimeoutConfig};
use crate::error::{Error, Result};
use crate::providers::{Embedder, VectorIndex};
use crate::types::{Chunk, Document};

use super::chunker::Chunker;

/// File extensions accepted by file ingest
const ALLOWED_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "text"];

/// Orchestrates the ingest path: chunk, embed in batches, upsert in batches
///
/// Within a document the batches run in order; chunk ids act as idempotency
/// keys, so a retried ingest after a partial failure re-upserts rather than
/// duplicating.
pub struct Ingestor {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    config: IngestConfig,
    embed_timeout: Duration,
    vector_timeout: Duration,
    embed_timeout_secs: u64,
    vector_timeout_secs: u64,
}

impl Ingestor {
    /// Create an ingestor, validating the chunking configuration
    pub fn new(
        chunking: &ChunkingConfig,
        config: IngestConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        timeouts: &TimeoutConfig,
    ) -> Result<Self> {
        Ok(Self {
            chunker: Chunker::new(chunking)?,
            embedder,
            index,
            config,
            embed_timeout: Duration::from_secs(timeouts.embed_timeout_secs),
            vector_timeout: Duration::from_secs(timeouts.vector_timeout_secs),
            embed_timeout_secs: timeouts.embed_timeout_secs,
            vector_timeout_secs: timeouts.vector_timeout_secs,
        })
    }

    /// Ingest one document from raw text
    pub async fn ingest_text(
        &self,
        doc_name: &str,
        text: &str,
        source_path: Option<String>,
    ) -> Result<Document> {
        if doc_name.trim().is_empty() {
            return Err(Error::invalid_input("document name must not be blank"));
        }

        let mut doc = Document {
            id: Uuid::new_v4(),
            name: doc_name.trim().to_string(),
            source_path,
            created_utc: chrono::Utc::now(),
            chunk_count: 0,
            // Character count, not byte count; the unit is documented on the
            // API surface.
            total_size_bytes: text.chars().count() as u64,
        };

        let mut chunks = self.chunker.chunk(&doc, text)?;
        if chunks.is_empty() {
            return Err(Error::EmptyDocument(doc.name));
        }

        let total = chunks.len();
        for batch in chunks.chunks_mut(self.config.embedding_batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

            let vectors = timeout(self.embed_timeout, self.embedder.embed_batch(&texts))
                .await
                .map_err(|_| Error::UpstreamTimeout {
                    operation: "embedding",
                    timeout_secs: self.embed_timeout_secs,
                })??;

            if vectors.len() != batch.len() {
                return Err(Error::model_invalid(format!(
                    "embedder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            for (chunk, vector) in batch.iter_mut().zip(vectors) {
                chunk.embedding = vector;
            }

            for sub_batch in batch.chunks(self.config.vector_store_batch_size) {
                self.upsert(sub_batch).await?;
            }
        }

        doc.chunk_count = total as u32;
        tracing::info!(
            doc = %doc.name,
            chunks = total,
            chars = doc.total_size_bytes,
            "document ingested"
        );
        Ok(doc)
    }

    /// Ingest files from disk, skipping and logging the ones that cannot be
    /// ingested
    pub async fn ingest_files(&self, paths: &[PathBuf]) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for path in paths {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unnamed")
                .to_string();

            match self.read_file(path).await {
                Ok(text) => {
                    match self
                        .ingest_text(&name, &text, Some(path.display().to_string()))
                        .await
                    {
                        Ok(doc) => documents.push(doc),
                        Err(e) => tracing::warn!(file = %name, error = %e, "skipping file"),
                    }
                }
                Err(e) => tracing::warn!(file = %name, error = %e, "skipping file"),
            }
        }

        Ok(documents)
    }

    /// Whether a file name carries an accepted extension
    pub fn is_allowed_file(name: &str) -> bool {
        std::path::Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Per-file size limit, for callers validating uploads
    pub fn max_file_size_bytes(&self) -> u64 {
        self.config.max_file_size_bytes
    }

    async fn read_file(&self, path: &PathBuf) -> Result<String> {
        let metadata = tokio::fs::metadata(path).await.map_err(|_| {
            Error::invalid_input(format!("file not found: {}", path.display()))
        })?;

        if metadata.len() > self.config.max_file_size_bytes {
            return Err(Error::invalid_input(format!(
                "file exceeds {} bytes: {}",
                self.config.max_file_size_bytes,
                path.display()
            )));
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !Self::is_allowed_file(name) {
            return Err(Error::invalid_input(format!(
                "unsupported file extension: {}",
                path.display()
            )));
        }

        Ok(tokio::fs::read_to_string(path).await?)
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        timeout(self.vector_timeout, self.index.upsert(chunks))
            .await
            .map_err(|_| Error::UpstreamTimeout {
                operation: "vector upsert",
                timeout_secs: self.vector_timeout_secs,
            })?
    }
}
