//! Query embedding and top-K chunk retrieval

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::{AskConfig, TimeoutConfig};
use crate::error::{Error, Result};
use crate::providers::{Embedder, RetrievedChunk, VectorIndex};

/// Embeds a query and returns the most similar chunks
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    min_score: Option<f32>,
    embed_timeout: Duration,
    vector_timeout: Duration,
    embed_timeout_secs: u64,
    vector_timeout_secs: u64,
}

impl Retriever {
    /// Create a retriever over the given embedder and index
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        ask: &AskConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            min_score: ask.min_similarity_score,
            embed_timeout: Duration::from_secs(timeouts.embed_timeout_secs),
            vector_timeout: Duration::from_secs(timeouts.vector_timeout_secs),
            embed_timeout_secs: timeouts.embed_timeout_secs,
            vector_timeout_secs: timeouts.vector_timeout_secs,
        }
    }

    /// Top-K chunks for a query, in descending similarity order
    ///
    /// An empty result is a valid outcome, not an error.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let vector = timeout(self.embed_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| Error::UpstreamTimeout {
                operation: "query embedding",
                timeout_secs: self.embed_timeout_secs,
            })??;

        let results = timeout(
            self.vector_timeout,
            self.index.search(&vector, top_k, self.min_score),
        )
        .await
        .map_err(|_| Error::UpstreamTimeout {
            operation: "vector search",
            timeout_secs: self.vector_timeout_secs,
        })??;

        tracing::debug!(top_k, hits = results.len(), "retrieval complete");
        Ok(results)
    }
}
