//! Qdrant vector backend over its REST API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::config::{TimeoutConfig, VectorConfig};
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::vector::{RetrievedChunk, VectorIndex};

const SCROLL_PAGE_SIZE: usize = 256;

/// Qdrant-backed vector index
///
/// Chunks are stored as points whose payload is the chunk record minus its
/// embedding; Qdrant reports cosine similarity directly, so scores pass
/// through unconverted.
#[derive(Debug)]
pub struct QdrantVectorIndex {
    client: Client,
    base_url: String,
    collection: String,
    dimensions: usize,
    timeout_secs: u64,
}

impl QdrantVectorIndex {
    /// Create a client for a Qdrant collection
    pub fn new(config: &VectorConfig, timeouts: &TimeoutConfig, dimensions: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeouts.vector_timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            dimensions,
            timeout_secs: timeouts.vector_timeout_secs,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    fn transport_error(&self, operation: &'static str, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::UpstreamTimeout {
                operation,
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::vector(format!("{operation} request failed: {err}"))
        }
    }

    async fn status_error(operation: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::vector(format!("{operation} failed: HTTP {status} - {body}"))
    }

    fn payload_to_chunk(payload: Value) -> Result<Chunk> {
        serde_json::from_value(payload)
            .map_err(|e| Error::vector(format!("malformed chunk payload: {e}")))
    }

    /// Walk the whole collection (optionally filtered) page by page
    async fn scroll(&self, filter: Option<Value>) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let mut offset: Option<Value> = None;

        loop {
            let mut body = json!({
                "limit": SCROLL_PAGE_SIZE,
                "with_payload": true,
                "with_vector": false,
            });
            if let Some(filter) = &filter {
                body["filter"] = filter.clone();
            }
            if let Some(offset) = &offset {
                body["offset"] = offset.clone();
            }

            let response = self
                .client
                .post(format!("{}/points/scroll", self.collection_url()))
                .json(&body)
                .send()
                .await
                .map_err(|e| self.transport_error("scroll", e))?;

            if !response.status().is_success() {
                return Err(Self::status_error("scroll", response).await);
            }

            let parsed: ScrollResponse = response
                .json()
                .await
                .map_err(|e| Error::vector(format!("bad scroll response: {e}")))?;

            for point in parsed.result.points {
                chunks.push(Self::payload_to_chunk(point.payload)?);
            }

            match parsed.result.next_page_offset {
                Some(next) if !next.is_null() => offset = Some(next),
                _ => break,
            }
        }

        Ok(chunks)
    }
}

#[derive(Serialize)]
struct UpsertPoint {
    id: Uuid,
    vector: Vec<f32>,
    payload: Value,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    payload: Value,
}

#[derive(Deserialize)]
struct ScrollResponse {
    result: ScrollResult,
}

#[derive(Deserialize)]
struct ScrollResult {
    points: Vec<ScrollPoint>,
    next_page_offset: Option<Value>,
}

#[derive(Deserialize)]
struct ScrollPoint {
    payload: Value,
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn initialize(&self) -> Result<()> {
        let existing = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|e| self.transport_error("collection check", e))?;

        if existing.status().is_success() {
            return Ok(());
        }
        if existing.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Self::status_error("collection check", existing).await);
        }

        let body = json!({
            "vectors": {
                "size": self.dimensions,
                "distance": "Cosine",
            }
        });

        let response = self
            .client
            .put(self.collection_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("collection create", e))?;

        // A concurrent initialize may have won the race; conflict is fine.
        if !response.status().is_success() && response.status() != reqwest::StatusCode::CONFLICT {
            return Err(Self::status_error("collection create", response).await);
        }

        tracing::info!(collection = %self.collection, "Qdrant collection ready");
        Ok(())
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut points = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(Error::InvalidChunk(format!(
                    "chunk {} of '{}' has no embedding",
                    chunk.index, chunk.document_name
                )));
            }
            let payload = serde_json::to_value(chunk.without_embedding())
                .map_err(|e| Error::vector(format!("failed to encode payload: {e}")))?;
            points.push(UpsertPoint {
                id: chunk.id,
                vector: chunk.embedding.clone(),
                payload,
            });
        }

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| self.transport_error("upsert", e))?;

        if !response.status().is_success() {
            return Err(Self::status_error("upsert", response).await);
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<RetrievedChunk>> {
        let mut body = json!({
            "vector": query,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(floor) = min_score {
            body["score_threshold"] = json!(floor);
        }

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error("search", e))?;

        if !response.status().is_success() {
            return Err(Self::status_error("search", response).await);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::vector(format!("bad search response: {e}")))?;

        parsed
            .result
            .into_iter()
            .map(|point| {
                Ok(RetrievedChunk {
                    chunk: Self::payload_to_chunk(point.payload)?,
                    score: point.score,
                })
            })
            .collect()
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let chunks = self.scroll(None).await?;

        let mut groups: std::collections::HashMap<Uuid, Document> =
            std::collections::HashMap::new();
        for chunk in chunks {
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
        Ok(documents)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let chunks = self.get_document_chunks(id).await?;
        if chunks.is_empty() {
            return Ok(None);
        }

        let created_utc = chunks.iter().map(|c| c.created_utc).min().unwrap_or_else(chrono::Utc::now);
        Ok(Some(Document {
            id,
            name: chunks[0].document_name.clone(),
            source_path: None,
            created_utc,
            chunk_count: chunks.len() as u32,
            total_size_bytes: chunks.iter().map(|c| c.text.chars().count() as u64).sum(),
        }))
    }

    async fn get_document_chunks(&self, id: Uuid) -> Result<Vec<Chunk>> {
        let filter = json!({
            "must": [
                { "key": "documentId", "match": { "value": id.to_string() } }
            ]
        });

        let mut chunks = self.scroll(Some(filter)).await?;
        chunks.sort_by_key(|c| c.index);
        Ok(chunks)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
