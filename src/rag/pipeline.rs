use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::store::{StoreError, VectorStore};
use crate::llm::prompt::build_context;
use crate::llm::{CompletionProvider, EmbeddingProvider, ProviderError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("the system has not been initialized; call POST /initialize first")]
    NotInitialized,
    #[error("embedding failed: {0}")]
    Embedding(#[source] ProviderError),
    #[error("vector store query failed: {0}")]
    Store(#[from] StoreError),
    #[error("completion failed: {0}")]
    Completion(#[source] ProviderError),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Answer {
    pub response: String,
    pub passages_used: usize,
}

/// Embed → retrieve → complete. Built once, then shared read-only.
#[derive(Clone)]
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    completion: Arc<dyn CompletionProvider>,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        completion: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedder,
            store,
            completion,
        }
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub async fn answer(&self, query: &str, top_k: usize) -> Result<Answer, PipelineError> {
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(PipelineError::Embedding)?;

        let passages = self.store.query(&embedding, top_k).await?;
        tracing::debug!(
            top_k,
            retrieved = passages.len(),
            best_score = passages.first().map(|p| p.score),
            "passages retrieved"
        );

        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let context = build_context(&texts);

        let response = self
            .completion
            .complete(query, &context)
            .await
            .map_err(PipelineError::Completion)?;

        Ok(Answer {
            response,
            passages_used: passages.len(),
        })
    }
}
