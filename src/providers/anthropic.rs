//! Anthropic chat client
//!
//! Anthropic does not expose an embedding API, so this provider is chat-only;
//! the factory pairs it with an embedding provider from another family.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ModelConfig, TimeoutConfig};
use crate::error::{Error, Result};

use super::chat::{ChatModel, ChatOutcome};
use super::ANSWER_TEMPERATURE;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_ANSWER_TOKENS: u32 = 2048;

/// Anthropic Messages API client
pub struct AnthropicChat {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    chat_timeout: Duration,
    chat_timeout_secs: u64,
}

impl std::fmt::Debug for AnthropicChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicChat")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("chat_timeout_secs", &self.chat_timeout_secs)
            .finish()
    }
}

impl AnthropicChat {
    /// Create a new Anthropic chat client
    pub fn new(config: &ModelConfig, timeouts: &TimeoutConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("Anthropic requires an API key"))?;

        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: config.chat_model.clone(),
            chat_timeout: Duration::from_secs(timeouts.chat_timeout_secs),
            chat_timeout_secs: timeouts.chat_timeout_secs,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: Option<u32>,
    output_tokens: Option<u32>,
}

#[async_trait]
impl ChatModel for AnthropicChat {
    async fn complete(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_ANSWER_TOKENS,
            system: system.to_string(),
            temperature: ANSWER_TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(self.chat_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::UpstreamTimeout {
                        operation: "chat",
                        timeout_secs: self.chat_timeout_secs,
                    }
                } else {
                    Error::model(format!("chat request failed: {e}"))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                Error::model_invalid(format!("chat failed: HTTP {status} - {body}"))
            } else {
                Error::model(format!("chat failed: HTTP {status} - {body}"))
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::model_invalid(format!("bad chat response: {e}")))?;

        let text: String = parsed.content.into_iter().map(|block| block.text).collect();
        if text.is_empty() {
            return Err(Error::model_invalid("chat response had no text"));
        }

        let tokens_used = parsed.usage.map(|usage| {
            usage.input_tokens.unwrap_or(0) + usage.output_tokens.unwrap_or(0)
        });

        Ok(ChatOutcome { text, tokens_used })
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
