//! Document and chunk types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum snippet length in characters
const SNIPPET_CHARS: usize = 240;

/// A document that has been ingested
///
/// Documents are derived aggregates: the vector store is the durable source
/// of truth for chunks, and `ListDocuments` reconstructs these records by
/// grouping stored chunks per document id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique document ID, generated fresh on ingest
    pub id: Uuid,
    /// Display name, typically a filename
    pub name: String,
    /// Optional provenance (original file path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    /// Ingest timestamp
    pub created_utc: DateTime<Utc>,
    /// Number of chunks stored for this document
    pub chunk_count: u32,
    /// Size of the ingested text in characters
    pub total_size_bytes: u64,
}

/// A bounded, indexed slice of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Owning document
    pub document_id: Uuid,
    /// Owning document's display name, denormalized so retrieval results
    /// render without a join
    pub document_name: String,
    /// 0-based position within the owning document, gap-free
    pub index: u32,
    /// Full chunk text
    pub text: String,
    /// Preview of `text`, at most 240 characters plus a trailing ellipsis
    pub snippet: String,
    /// Lowercase hex SHA-256 of `text`
    pub hash: String,
    /// Embedding vector; required before upsert, stripped on read paths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    /// Inherited from the owning document
    pub created_utc: DateTime<Utc>,
}

impl Chunk {
    /// Return a copy without the embedding vector
    pub fn without_embedding(&self) -> Self {
        Self {
            embedding: Vec::new(),
            ..self.clone()
        }
    }
}

/// Build the preview snippet for a chunk text
pub fn make_snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Lowercase hex SHA-256 of a chunk text
pub fn content_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_its_own_snippet() {
        assert_eq!(make_snippet("check the dashboard"), "check the dashboard");
    }

    #[test]
    fn long_text_gets_ellipsis() {
        let text = "x".repeat(500);
        let snippet = make_snippet(&text);
        assert!(snippet.starts_with(&"x".repeat(240)));
        assert!(snippet.ends_with("..."));
        assert_eq!(snippet.chars().count(), 243);
    }

    #[test]
    fn hash_is_lowercase_hex() {
        let hash = content_hash("abc");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
