//! Retrieval-augmented generation over the plan collection.
//!
//! - `VectorStore` / `SqliteVectorStore`: persisted passages and embeddings
//! - `RagPipeline`: embed the query, fetch the nearest passages, ask the model

pub mod pipeline;
pub mod sqlite;
pub mod store;

pub use pipeline::{Answer, PipelineError, RagPipeline};
pub use sqlite::SqliteVectorStore;
pub use store::{Document, ScoredDocument, StoreError, VectorStore};
