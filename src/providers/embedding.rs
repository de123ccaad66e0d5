//! Embedding provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Converts text to fixed-dimensional float vectors
///
/// Implementations must return vectors of a consistent dimension matching the
/// configured vector index, and batch calls must be length-preserving and
/// order-preserving. Providers without native batch support loop internally
/// via the default implementation.
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple texts, one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Embedding vector dimension
    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}
