use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::{AppState, InitOutcome};

/// POST /initialize
pub async fn initialize(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let message = match state.initialize().await? {
        InitOutcome::Initialized => "System initialized successfully",
        InitOutcome::AlreadyInitialized => "System was already initialized",
    };

    Ok(Json(json!({ "message": message })))
}
