//! The ask pipeline: guardrail, retrieval, generation, citation parsing
//!
//! ```text
//! START -> GUARDRAIL -severe-> REFUSE
//!             |
//!         RETRIEVE -empty-> IDK
//!             |
//!         GENERATE (default or strict)
//!             |
//!         PARSE_CITATIONS -no citations & not "I don't know"-> one strict retry
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::config::{AskConfig, TimeoutConfig};
use crate::error::{Error, Result};
use crate::guardrail::{Guardrail, Severity};
use crate::providers::{ChatModel, ChatOutcome, RetrievedChunk};
use crate::retrieval::Retriever;
use crate::types::{AskResponse, Citation, RetrievedSource};

use super::citation::parse_citations;
use super::prompt::{build_context, build_user_prompt, STRICT_SYSTEM_PROMPT, SYSTEM_PROMPT};

/// Fixed refusal for severe guardrail verdicts
pub const REFUSAL_ANSWER: &str =
    "I cannot process this request. Please ask a question about payment operations.";

/// Answer when retrieval comes back empty
pub const IDK_ANSWER: &str = "I don't know based on the provided runbooks.";

/// Prefix of every error response
pub const ERROR_ANSWER_PREFIX: &str = "An error occurred while processing your question.";

/// Marker appended to questions cut at the length limit
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Answers questions against the ingested corpus with citation discipline
pub struct Answerer {
    retriever: Arc<Retriever>,
    chat: Arc<dyn ChatModel>,
    guardrail: Guardrail,
    config: AskConfig,
    chat_timeout: Duration,
    chat_timeout_secs: u64,
}

impl Answerer {
    /// Create an answerer over the given retriever and chat model
    pub fn new(
        retriever: Arc<Retriever>,
        chat: Arc<dyn ChatModel>,
        config: AskConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self {
            retriever,
            chat,
            guardrail: Guardrail::new(),
            config,
            chat_timeout: Duration::from_secs(timeouts.chat_timeout_secs),
            chat_timeout_secs: timeouts.chat_timeout_secs,
        }
    }

    /// Run the ask pipeline
    ///
    /// Never fails: upstream errors become an error-shaped response with the
    /// timer and any partial audit trail still set.
    pub async fn ask(&self, question: &str, top_k: Option<usize>) -> AskResponse {
        let start = Instant::now();

        let report = self.guardrail.inspect(question);
        if report.is_severe() {
            return AskResponse {
                answer_markdown: REFUSAL_ANSWER.to_string(),
                citations: Vec::new(),
                retrieved: Vec::new(),
                elapsed_ms: start.elapsed().as_millis() as u64,
                tokens_used: None,
            };
        }
        let strict_first = report.severity == Severity::Moderate;

        let mut retrieved: Vec<RetrievedChunk> = Vec::new();
        match self.run(question, top_k, strict_first, &mut retrieved).await {
            Ok((answer_markdown, citations, tokens_used)) => AskResponse {
                answer_markdown,
                citations,
                retrieved: to_sources(&retrieved),
                elapsed_ms: start.elapsed().as_millis() as u64,
                tokens_used,
            },
            Err(err) => {
                tracing::error!(error = %err, "ask pipeline failed");
                AskResponse {
                    answer_markdown: format!("{ERROR_ANSWER_PREFIX} ({err})"),
                    citations: Vec::new(),
                    retrieved: to_sources(&retrieved),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    tokens_used: None,
                }
            }
        }
    }

    async fn run(
        &self,
        question: &str,
        top_k: Option<usize>,
        strict_first: bool,
        retrieved: &mut Vec<RetrievedChunk>,
    ) -> Result<(String, Vec<Citation>, Option<u32>)> {
        let question = self.bound_question(question);
        let top_k = top_k.unwrap_or(self.config.default_top_k);

        *retrieved = self.retriever.retrieve(&question, top_k).await?;
        if retrieved.is_empty() {
            return Ok((
                format!("{IDK_ANSWER} Try ingesting more runbooks that cover this topic."),
                Vec::new(),
                None,
            ));
        }

        let context = build_context(retrieved);
        let user_prompt = build_user_prompt(&question, &context);
        let system = if strict_first {
            STRICT_SYSTEM_PROMPT
        } else {
            SYSTEM_PROMPT
        };

        let outcome = self.complete(system, &user_prompt).await?;
        let mut citations = parse_citations(&outcome.text, retrieved);
        let mut answer = outcome.text;
        let mut tokens_used = outcome.tokens_used;

        // One bounded retry: an answer that neither cites nor declines is not
        // auditable.
        if citations.is_empty() && !answer.to_lowercase().contains("i don't know") {
            tracing::info!("answer had no citations, retrying with strict prompt");
            let retry = self.complete(STRICT_SYSTEM_PROMPT, &user_prompt).await?;
            citations = parse_citations(&retry.text, retrieved);
            answer = retry.text;
            tokens_used = match (tokens_used, retry.tokens_used) {
                (Some(a), Some(b)) => Some(a + b),
                (a, b) => a.or(b),
            };
        }

        Ok((answer, citations, tokens_used))
    }

    async fn complete(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        timeout(self.chat_timeout, self.chat.complete(system, user))
            .await
            .map_err(|_| Error::UpstreamTimeout {
                operation: "chat",
                timeout_secs: self.chat_timeout_secs,
            })?
    }

    /// Enforce the question length limit, appending the truncation marker
    fn bound_question(&self, question: &str) -> String {
        let limit = self.config.max_question_length;
        if question.chars().count() <= limit {
            return question.to_string();
        }
        let head: String = question.chars().take(limit).collect();
        format!("{head}{TRUNCATION_MARKER}")
    }
}

fn to_sources(retrieved: &[RetrievedChunk]) -> Vec<RetrievedSource> {
    retrieved
        .iter()
        .map(|r| RetrievedSource {
            document_name: r.chunk.document_name.clone(),
            chunk_index: r.chunk.index,
            snippet: r.chunk.snippet.clone(),
            score: r.score,
        })
        .collect()
}
