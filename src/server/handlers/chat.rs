use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::config::RagConfig;
use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub query: Option<String>,
    pub top_k: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub passages_used: usize,
}

/// POST /chat
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let query = body
        .query
        .as_deref()
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("A query is required (query)".to_string()))?;
    let top_k = resolve_top_k(body.top_k, &state.config.rag)?;

    let pipeline = state.pipeline()?;
    let answer = pipeline.answer(query, top_k).await?;
    tracing::info!(top_k, passages_used = answer.passages_used, "chat answered");

    Ok(Json(ChatResponse {
        response: answer.response,
        passages_used: answer.passages_used,
    }))
}

/// A `top_k` above the collection size is fine; the store returns what it has.
fn resolve_top_k(requested: Option<i64>, config: &RagConfig) -> Result<usize, ApiError> {
    let Some(top_k) = requested else {
        return Ok(config.default_top_k);
    };

    if top_k < 1 {
        return Err(ApiError::BadRequest(format!(
            "top_k must be at least 1 (got {})",
            top_k
        )));
    }

    Ok(usize::try_from(top_k).unwrap_or(usize::MAX))
}
