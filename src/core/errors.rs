use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::rag::PipelineError;
use crate::state::error::InitializationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not initialized: {0}")]
    NotInitialized(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotInitialized(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotInitialized(msg) => msg.clone(),
            ApiError::Internal(msg) => format!("Internal server error: {}", msg),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotInitialized => ApiError::NotInitialized(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<InitializationError> for ApiError {
    fn from(err: InitializationError) -> Self {
        ApiError::Internal(format!("Initialization failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed: {}", message);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
