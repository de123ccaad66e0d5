//! Ask endpoint

use axum::{extract::State, Json};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{AskRequest, AskResponse};

/// POST /api/ask - answer a question from the ingested corpus
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>> {
    if request.question.trim().is_empty() {
        return Err(Error::invalid_input("question must not be blank"));
    }
    if request.top_k == Some(0) {
        return Err(Error::invalid_input("topK must be greater than zero"));
    }

    tracing::info!(top_k = ?request.top_k, "ask: {:?}", request.question);

    let response = state.answerer().ask(&request.question, request.top_k).await;

    tracing::info!(
        elapsed_ms = response.elapsed_ms,
        citations = response.citations.len(),
        retrieved = response.retrieved.len(),
        "ask complete"
    );

    Ok(Json(response))
}
