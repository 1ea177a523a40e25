use thiserror::Error;

use crate::llm::ProviderError;
use crate::rag::StoreError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to open vector store: {0}")]
    Store(#[source] StoreError),

    #[error("Failed to create model client: {0}")]
    Provider(#[source] ProviderError),
}
