//! OpenAI-compatible chat and embedding client
//!
//! One wire client covers the OpenAI, Azure OpenAI, and Mistral tags: the
//! request and response shapes are shared and only the base URL and auth
//! header differ.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ModelConfig, TimeoutConfig};
use crate::error::{Error, Result};

use super::chat::{ChatModel, ChatOutcome};
use super::embedding::Embedder;
use super::ANSWER_TEMPERATURE;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const MISTRAL_BASE_URL: &str = "https://api.mistral.ai";
const AZURE_API_VERSION: &str = "2024-02-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    OpenAi,
    Azure,
    Mistral,
}

/// Chat + embedding client for OpenAI-compatible APIs
pub struct OpenAiCompatibleClient {
    client: Client,
    flavor: Flavor,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    dimensions: usize,
    embed_timeout: Duration,
    chat_timeout: Duration,
    embed_timeout_secs: u64,
    chat_timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("flavor", &self.flavor)
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("dimensions", &self.dimensions)
            .field("embed_timeout_secs", &self.embed_timeout_secs)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .finish()
    }
}

impl OpenAiCompatibleClient {
    /// Client for the OpenAI API
    pub fn openai(config: &ModelConfig, timeouts: &TimeoutConfig) -> Result<Self> {
        Self::build(config, timeouts, Flavor::OpenAi, OPENAI_BASE_URL)
    }

    /// Client for an Azure OpenAI resource; `base_url` names the resource
    pub fn azure(config: &ModelConfig, timeouts: &TimeoutConfig) -> Result<Self> {
        if config.base_url.is_none() {
            return Err(Error::config(
                "Azure OpenAI requires the resource endpoint as base_url",
            ));
        }
        Self::build(config, timeouts, Flavor::Azure, "")
    }

    /// Client for the Mistral API
    pub fn mistral(config: &ModelConfig, timeouts: &TimeoutConfig) -> Result<Self> {
        Self::build(config, timeouts, Flavor::Mistral, MISTRAL_BASE_URL)
    }

    fn build(
        config: &ModelConfig,
        timeouts: &TimeoutConfig,
        flavor: Flavor,
        default_base: &str,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("model provider requires an API key"))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            flavor,
            base_url,
            api_key,
            chat_model: config.chat_model.clone(),
            embedding_model: config.embedding_model.clone(),
            dimensions: config.dimension,
            embed_timeout: Duration::from_secs(timeouts.embed_timeout_secs),
            chat_timeout: Duration::from_secs(timeouts.chat_timeout_secs),
            embed_timeout_secs: timeouts.embed_timeout_secs,
            chat_timeout_secs: timeouts.chat_timeout_secs,
        })
    }

    fn embeddings_url(&self) -> String {
        match self.flavor {
            Flavor::Azure => format!(
                "{}/openai/deployments/{}/embeddings?api-version={}",
                self.base_url, self.embedding_model, AZURE_API_VERSION
            ),
            _ => format!("{}/v1/embeddings", self.base_url),
        }
    }

    fn chat_url(&self) -> String {
        match self.flavor {
            Flavor::Azure => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, self.chat_model, AZURE_API_VERSION
            ),
            _ => format!("{}/v1/chat/completions", self.base_url),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.flavor {
            Flavor::Azure => request.header("api-key", &self.api_key),
            _ => request.bearer_auth(&self.api_key),
        }
    }

    /// Azure addresses the deployment in the URL; the others take a model
    /// field in the body.
    fn body_model(&self, model: &str) -> Option<String> {
        match self.flavor {
            Flavor::Azure => None,
            _ => Some(model.to_string()),
        }
    }

    fn transport_error(
        &self,
        operation: &'static str,
        timeout_secs: u64,
        err: reqwest::Error,
    ) -> Error {
        if err.is_timeout() {
            Error::UpstreamTimeout {
                operation,
                timeout_secs,
            }
        } else {
            Error::model(format!("{operation} request failed: {err}"))
        }
    }

    async fn status_error(operation: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            Error::model_invalid(format!("{operation} failed: HTTP {status} - {body}"))
        } else {
            Error::model(format!("{operation} failed: HTTP {status} - {body}"))
        }
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: Option<u32>,
}

#[async_trait]
impl Embedder for OpenAiCompatibleClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::model_invalid("embeddings response was empty"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingsRequest {
            model: self.body_model(&self.embedding_model),
            input: texts.to_vec(),
        };

        let response = self
            .authorize(self.client.post(self.embeddings_url()))
            .timeout(self.embed_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error("embedding", self.embed_timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error("embedding", response).await);
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::model_invalid(format!("bad embeddings response: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(Error::model_invalid(format!(
                "embeddings response had {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        let mut items = parsed.data;
        items.sort_by_key(|item| item.index);
        Ok(items.into_iter().map(|item| item.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        match self.flavor {
            Flavor::OpenAi => "openai",
            Flavor::Azure => "azure-openai",
            Flavor::Mistral => "mistral",
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleClient {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        let request = ChatRequest {
            model: self.body_model(&self.chat_model),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            temperature: ANSWER_TEMPERATURE,
        };

        let response = self
            .authorize(self.client.post(self.chat_url()))
            .timeout(self.chat_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error("chat", self.chat_timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error("chat", response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::model_invalid(format!("bad chat response: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::model_invalid("chat response had no content"))?;

        Ok(ChatOutcome {
            text,
            tokens_used: parsed.usage.and_then(|u| u.total_tokens),
        })
    }

    fn name(&self) -> &str {
        Embedder::name(self)
    }

    fn model(&self) -> &str {
        &self.chat_model
    }
}
