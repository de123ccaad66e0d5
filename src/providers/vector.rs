//! Vector index trait

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::{Chunk, Document};

/// A chunk returned from similarity search
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    /// The matched chunk, without its embedding
    pub chunk: Chunk,
    /// Similarity score, normalized so higher means more similar
    pub score: f32,
}

/// Persists chunk records and answers cosine-similarity queries
///
/// The index is the durable source of truth for chunks; documents are
/// aggregates reconstructed from their stored chunks. Backends that report
/// distances must convert to similarity at this boundary so the rest of the
/// pipeline can treat scores uniformly.
#[async_trait]
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Create the backing collection if absent; safe to call repeatedly
    async fn initialize(&self) -> Result<()>;

    /// Insert or replace chunks by id
    ///
    /// Empty input is a no-op. A chunk without an embedding fails the whole
    /// batch. Chunk ids make retried upserts idempotent.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()>;

    /// Up to `top_k` chunks by descending similarity
    ///
    /// Results strictly below `min_score` are dropped when a floor is set.
    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>>;

    /// All documents, aggregated from stored chunks
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// One document by id, if any of its chunks are stored
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    /// A document's chunks ordered by index, without embeddings
    async fn get_document_chunks(&self, id: Uuid) -> Result<Vec<Chunk>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
