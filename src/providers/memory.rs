//! In-memory reference vector index
//!
//! Computes cosine similarity directly over a concurrent map. This is the
//! conformance reference for the `VectorIndex` contract and the default
//! backend for tests and local development.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::vector::{RetrievedChunk, VectorIndex};

/// Reference in-memory vector index
#[derive(Debug)]
pub struct MemoryVectorIndex {
    chunks: DashMap<Uuid, Chunk>,
    dimensions: usize,
}

impl MemoryVectorIndex {
    /// Create an empty index for vectors of the given dimension
    pub fn new(dimensions: usize) -> Self {
        Self {
            chunks: DashMap::new(),
            dimensions,
        }
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn aggregate_documents(&self) -> Vec<Document> {
        let mut groups: std::collections::HashMap<Uuid, Document> =
            std::collections::HashMap::new();

        for entry in self.chunks.iter() {
            let chunk = entry.value();
            let doc = groups.entry(chunk.document_id).or_insert_with(|| Document {
                id: chunk.document_id,
                name: chunk.document_name.clone(),
                source_path: None,
                created_utc: chunk.created_utc,
                chunk_count: 0,
                total_size_bytes: 0,
            });
            doc.chunk_count += 1;
            doc.total_size_bytes += chunk.text.chars().count() as u64;
            if chunk.created_utc < doc.created_utc {
                doc.created_utc = chunk.created_utc;
            }
        }

        let mut documents: Vec<Document> = groups.into_values().collect();
        documents.sort_by(|a, b| a.created_utc.cmp(&b.created_utc).then(a.name.cmp(&b.name)));
        documents
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        // Validate the whole batch before touching the map so a bad chunk
        // cannot leave a partial batch behind.
        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::InvalidChunk(format!(
                    "chunk {} of '{}' has no embedding",
                    chunk.index, chunk.document_name
                )));
            }
            if chunk.embedding.len() != self.dimensions {
                return Err(Error::InvalidChunk(format!(
                    "chunk {} of '{}' has dimension {} (index expects {})",
                    chunk.index,
                    chunk.document_name,
                    chunk.embedding.len(),
                    self.dimensions
                )));
            }
        }

        for chunk in chunks {
            self.chunks.insert(chunk.id, chunk.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<RetrievedChunk> = self
            .chunks
            .iter()
            .map(|entry| {
                let chunk = entry.value();
                RetrievedChunk {
                    score: cosine_similarity(query, &chunk.embedding),
                    chunk: chunk.without_embedding(),
                }
            })
            .filter(|r| min_score.map_or(true, |floor| r.score >= floor))
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);
        Ok(results)
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        Ok(self.aggregate_documents())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self
            .aggregate_documents()
            .into_iter()
            .find(|doc| doc.id == id))
    }

    async fn get_document_chunks(&self, id: Uuid) -> Result<Vec<Chunk>> {
        let mut chunks: Vec<Chunk> = self
            .chunks
            .iter()
            .filter(|entry| entry.value().document_id == id)
            .map(|entry| entry.value().without_embedding())
            .collect();
        chunks.sort_by_key(|c| c.index);
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Cosine similarity of two vectors; zero when either has zero norm
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
