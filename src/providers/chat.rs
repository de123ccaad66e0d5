//! Chat model provider trait

use async_trait::async_trait;

use crate::error::Result;

/// A single chat completion
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Model output text
    pub text: String,
    /// Total token usage, when the provider reports it
    pub tokens_used: Option<u32>,
}

/// Generates grounded answers from a system + user prompt pair
#[async_trait]
pub trait ChatModel: Send + Sync + std::fmt::Debug {
    /// Run one completion with low-temperature decoding
    async fn complete(&self, system: &str, user: &str) -> Result<ChatOutcome>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier in use
    fn model(&self) -> &str;
}
