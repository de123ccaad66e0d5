//! Similarity retrieval over the vector index

mod search;

pub use search::Retriever;
