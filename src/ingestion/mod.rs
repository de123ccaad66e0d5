//! Document ingestion pipeline

pub mod chunker;
pub mod ingestor;

pub use chunker::Chunker;
pub use ingestor::Ingestor;
