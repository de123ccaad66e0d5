//! Core data types

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document};
pub use query::AskRequest;
pub use response::{AskResponse, Citation, RetrievedSource};
