//! runbook-rag: operational Q&A over ingested runbooks with source citations
//!
//! A retrieval-augmented generation pipeline: documents are chunked into
//! deterministic overlapping windows, embedded, and upserted into a pluggable
//! vector index; questions pass a prompt-injection guardrail, retrieve their
//! top-K similar chunks, and are answered by a pluggable chat model under
//! strict grounding and `[docName:chunkIndex]` citation discipline.

pub mod config;
pub mod error;
pub mod generation;
pub mod guardrail;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::Answerer;
pub use guardrail::{Guardrail, Severity};
pub use ingestion::{Chunker, Ingestor};
pub use providers::{ChatModel, Embedder, RetrievedChunk, VectorIndex};
pub use retrieval::Retriever;
pub use types::{AskRequest, AskResponse, Chunk, Citation, Document};
