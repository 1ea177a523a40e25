//! VectorStore trait: the persistence seam of the RAG pipeline.
//!
//! The shipped backend is `SqliteVectorStore`; tests plug in their own.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored passage with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// `{source_file_name}_{row_index}` for bulk-imported rows.
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
        }
    }
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub text: String,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("embedding dimension mismatch: collection uses {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("cannot create store directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Collection this handle reads and writes.
    fn collection(&self) -> &str;

    /// Insert or overwrite documents by id, all in one transaction.
    ///
    /// Returns the number of documents written.
    async fn upsert(&self, documents: Vec<Document>) -> Result<usize, StoreError>;

    /// Up to `k` documents ranked by descending cosine similarity.
    ///
    /// Ties come back in unspecified order.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredDocument>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}
