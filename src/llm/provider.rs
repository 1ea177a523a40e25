use async_trait::async_trait;
use thiserror::Error;

use super::prompt::build_chat_request;
use super::types::ChatRequest;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("transient provider failure: {0}")]
    Transient(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status from the provider.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = format!("HTTP {}: {}", status, body.trim());
        match status {
            401 | 403 => ProviderError::Auth(detail),
            408 | 429 | 500..=599 => ProviderError::Transient(detail),
            _ => ProviderError::Rejected(detail),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Transient(err.to_string())
        }
    }
}

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// model identifier, used for logs and status
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Non-streaming chat completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn model(&self) -> &str;

    async fn chat(&self, request: ChatRequest) -> Result<String, ProviderError>;

    /// Answer `query` from `context` using the fixed plan-assistant template.
    async fn complete(&self, query: &str, context: &str) -> Result<String, ProviderError> {
        self.chat(build_chat_request(query, context)).await
    }
}
