//! Pluggable model and vector backend providers
//!
//! Providers are selected at startup from configured tags. Construction
//! fails fast on missing capability (an Anthropic embedder, an unsupported
//! vector backend) instead of deferring the failure to the first call.

pub mod anthropic;
pub mod chat;
pub mod embedding;
pub mod gemini;
pub mod memory;
pub mod openai;
pub mod qdrant;
pub mod vector;

pub use chat::{ChatModel, ChatOutcome};
pub use embedding::Embedder;
pub use memory::MemoryVectorIndex;
pub use vector::{RetrievedChunk, VectorIndex};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{ModelConfig, TimeoutConfig, VectorConfig};
use crate::error::{Error, Result};

/// Decoding temperature for grounded answers
pub(crate) const ANSWER_TEMPERATURE: f32 = 0.1;

/// Model provider tags recognized in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProviderKind {
    OpenAi,
    Google,
    Microsoft,
    Amazon,
    Anthropic,
    Mistral,
}

/// Vector backend tags recognized in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackendKind {
    Memory,
    Qdrant,
    AzureAiSearch,
    Postgres,
    Redis,
    OpenSearch,
}

/// The embedder + chat model pair selected for a deployment
#[derive(Debug)]
pub struct ProviderSet {
    pub embedder: Arc<dyn Embedder>,
    pub chat: Arc<dyn ChatModel>,
}

/// Build the chat and embedding providers for the configured tags
///
/// The chat tag also selects the embedder unless `embedding_provider`
/// overrides it; Anthropic as an embedding source is rejected here.
pub fn build_model_providers(
    config: &ModelConfig,
    timeouts: &TimeoutConfig,
) -> Result<ProviderSet> {
    let chat = build_chat_model(config.provider, config, timeouts)?;
    let embed_kind = config.embedding_provider.unwrap_or(config.provider);
    let embedder = build_embedder(embed_kind, config, timeouts)?;
    Ok(ProviderSet { embedder, chat })
}

fn build_chat_model(
    kind: ModelProviderKind,
    config: &ModelConfig,
    timeouts: &TimeoutConfig,
) -> Result<Arc<dyn ChatModel>> {
    match kind {
        ModelProviderKind::OpenAi => Ok(Arc::new(openai::OpenAiCompatibleClient::openai(
            config, timeouts,
        )?)),
        ModelProviderKind::Microsoft => Ok(Arc::new(openai::OpenAiCompatibleClient::azure(
            config, timeouts,
        )?)),
        ModelProviderKind::Mistral => Ok(Arc::new(openai::OpenAiCompatibleClient::mistral(
            config, timeouts,
        )?)),
        ModelProviderKind::Google => Ok(Arc::new(gemini::GeminiClient::new(config, timeouts)?)),
        ModelProviderKind::Anthropic => Ok(Arc::new(anthropic::AnthropicChat::new(config, timeouts)?)),
        ModelProviderKind::Amazon => Err(Error::config(
            "Amazon Bedrock is not supported by this build: its SigV4 request \
             signing is out of scope; select another model provider",
        )),
    }
}

fn build_embedder(
    kind: ModelProviderKind,
    config: &ModelConfig,
    timeouts: &TimeoutConfig,
) -> Result<Arc<dyn Embedder>> {
    match kind {
        ModelProviderKind::OpenAi => Ok(Arc::new(openai::OpenAiCompatibleClient::openai(
            config, timeouts,
        )?)),
        ModelProviderKind::Microsoft => Ok(Arc::new(openai::OpenAiCompatibleClient::azure(
            config, timeouts,
        )?)),
        ModelProviderKind::Mistral => Ok(Arc::new(openai::OpenAiCompatibleClient::mistral(
            config, timeouts,
        )?)),
        ModelProviderKind::Google => Ok(Arc::new(gemini::GeminiClient::new(config, timeouts)?)),
        ModelProviderKind::Anthropic => Err(Error::config(
            "Anthropic does not expose an embedding API; set embedding_provider \
             to a provider that does",
        )),
        ModelProviderKind::Amazon => Err(Error::config(
            "Amazon Bedrock is not supported by this build: its SigV4 request \
             signing is out of scope; select another embedding provider",
        )),
    }
}

/// Build the vector index for the configured backend tag
pub fn build_vector_index(
    config: &VectorConfig,
    timeouts: &TimeoutConfig,
    dimensions: usize,
) -> Result<Arc<dyn VectorIndex>> {
    match config.backend {
        VectorBackendKind::Memory => Ok(Arc::new(MemoryVectorIndex::new(dimensions))),
        VectorBackendKind::Qdrant => Ok(Arc::new(qdrant::QdrantVectorIndex::new(
            config, timeouts, dimensions,
        )?)),
        VectorBackendKind::AzureAiSearch
        | VectorBackendKind::Postgres
        | VectorBackendKind::Redis
        | VectorBackendKind::OpenSearch => Err(Error::config(format!(
            "vector backend {:?} is not compiled into this build; use memory or qdrant",
            config.backend
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_embeddings_fail_at_construction() {
        let config = ModelConfig {
            provider: ModelProviderKind::Anthropic,
            api_key: Some("key".to_string()),
            ..ModelConfig::default()
        };
        let err = build_model_providers(&config, &TimeoutConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn anthropic_chat_pairs_with_foreign_embedder() {
        let config = ModelConfig {
            provider: ModelProviderKind::Anthropic,
            embedding_provider: Some(ModelProviderKind::OpenAi),
            api_key: Some("key".to_string()),
            ..ModelConfig::default()
        };
        let set = build_model_providers(&config, &TimeoutConfig::default()).unwrap();
        assert_eq!(set.chat.name(), "anthropic");
        assert_eq!(set.embedder.name(), "openai");
    }

    #[test]
    fn missing_api_key_fails_at_construction() {
        let config = ModelConfig::default();
        assert!(build_model_providers(&config, &TimeoutConfig::default()).is_err());
    }

    #[test]
    fn unsupported_vector_backend_fails_fast() {
        let config = VectorConfig {
            backend: VectorBackendKind::Redis,
            ..VectorConfig::default()
        };
        let err = build_vector_index(&config, &TimeoutConfig::default(), 8).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
