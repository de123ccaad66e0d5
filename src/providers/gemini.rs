//! Google Gemini chat and embedding client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ModelConfig, TimeoutConfig};
use crate::error::{Error, Result};

use super::chat::{ChatModel, ChatOutcome};
use super::embedding::Embedder;
use super::ANSWER_TEMPERATURE;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini client via the Generative Language API
pub struct GeminiClient {
    client: Client,
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

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("dimensions", &self.dimensions)
            .field("embed_timeout_secs", &self.embed_timeout_secs)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: &ModelConfig, timeouts: &TimeoutConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("Gemini requires an API key"))?;

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
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

    fn endpoint(&self, model: &str, verb: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, model, verb, self.api_key
        )
    }

    fn transport_error(
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
            || status == reqwest::StatusCode::BAD_REQUEST
        {
            Error::model_invalid(format!("{operation} failed: HTTP {status} - {body}"))
        } else {
            Error::model(format!("{operation} failed: HTTP {status} - {body}"))
        }
    }
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbedValues>,
}

#[derive(Deserialize)]
struct EmbedValues {
    values: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::model_invalid("embedding response was empty"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: format!("models/{}", self.embedding_model),
                    content: Content {
                        role: None,
                        parts: vec![Part { text: text.clone() }],
                    },
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.endpoint(&self.embedding_model, "batchEmbedContents"))
            .timeout(self.embed_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error("embedding", self.embed_timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error("embedding", response).await);
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::model_invalid(format!("bad embedding response: {e}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::model_invalid(format!(
                "embedding response had {} vectors for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: user.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: ANSWER_TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(self.endpoint(&self.chat_model, "generateContent"))
            .timeout(self.chat_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error("chat", self.chat_timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(Self::status_error("chat", response).await);
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::model_invalid(format!("bad chat response: {e}")))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::model_invalid("chat response had no text"))?;

        Ok(ChatOutcome {
            text,
            tokens_used: parsed.usage_metadata.and_then(|u| u.total_token_count),
        })
    }

    fn name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.chat_model
    }
}
