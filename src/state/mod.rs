use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::core::config::{AppConfig, AppPaths};
use crate::core::security::Credentials;
use crate::llm::{GeminiChat, GeminiEmbeddings};
use crate::rag::{PipelineError, RagPipeline, SqliteVectorStore, StoreError};

pub mod error;

use error::InitializationError;

/// Builds the pipeline components (clients and store handle).
#[async_trait]
pub trait ComponentLoader: Send + Sync {
    async fn load(&self) -> Result<RagPipeline, InitializationError>;
}

/// Gemini clients over the on-disk SQLite collection.
pub struct GeminiLoader {
    paths: Arc<AppPaths>,
    config: Arc<AppConfig>,
    credentials: Credentials,
}

impl GeminiLoader {
    pub fn new(paths: Arc<AppPaths>, config: Arc<AppConfig>, credentials: Credentials) -> Self {
        Self {
            paths,
            config,
            credentials,
        }
    }
}

#[async_trait]
impl ComponentLoader for GeminiLoader {
    async fn load(&self) -> Result<RagPipeline, InitializationError> {
        let embedder = GeminiEmbeddings::new(&self.config.models, &self.credentials)
            .map_err(InitializationError::Provider)?;
        let completion = GeminiChat::new(&self.config.models, &self.credentials)
            .map_err(InitializationError::Provider)?;
        let store = SqliteVectorStore::new(self.paths.as_ref(), &self.config.rag.collection)
            .await
            .map_err(InitializationError::Store)?;

        tracing::info!(
            embedding_model = %self.config.models.embedding_model,
            chat_model = %self.config.models.chat_model,
            collection = %self.config.rag.collection,
            store = %store.db_path().display(),
            "pipeline components loaded"
        );

        Ok(RagPipeline::new(
            Arc::new(embedder),
            Arc::new(store),
            Arc::new(completion),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyInitialized,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusSnapshot {
    pub embeddings_model_loaded: bool,
    pub chain_loaded: bool,
    pub data_loaded: bool,
    pub data_size: usize,
}

/// Application context shared by every handler.
///
/// The pipeline is empty until `initialize` succeeds; after that it is
/// shared read-only for the lifetime of the process.
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub started_at: DateTime<Utc>,
    loader: Arc<dyn ComponentLoader>,
    pipeline: OnceCell<RagPipeline>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, loader: Arc<dyn ComponentLoader>) -> Arc<Self> {
        Arc::new(Self {
            config,
            started_at: Utc::now(),
            loader,
            pipeline: OnceCell::new(),
        })
    }

    /// Builds the pipeline at most once.
    ///
    /// Concurrent callers wait for the in-flight build. A failed build
    /// leaves the state uninitialized so a later call can retry.
    pub async fn initialize(&self) -> Result<InitOutcome, InitializationError> {
        let built_here = AtomicBool::new(false);
        let flag = &built_here;
        let loader = self.loader.clone();

        self.pipeline
            .get_or_try_init(move || async move {
                flag.store(true, Ordering::SeqCst);
                loader.load().await
            })
            .await?;

        if built_here.load(Ordering::SeqCst) {
            tracing::info!("system initialized");
            Ok(InitOutcome::Initialized)
        } else {
            Ok(InitOutcome::AlreadyInitialized)
        }
    }

    pub fn pipeline(&self) -> Result<&RagPipeline, PipelineError> {
        self.pipeline.get().ok_or(PipelineError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.initialized()
    }

    pub async fn status(&self) -> Result<StatusSnapshot, StoreError> {
        let Some(pipeline) = self.pipeline.get() else {
            return Ok(StatusSnapshot {
                embeddings_model_loaded: false,
                chain_loaded: false,
                data_loaded: false,
                data_size: 0,
            });
        };

        let data_size = pipeline.store().count().await?;
        Ok(StatusSnapshot {
            embeddings_model_loaded: true,
            chain_loaded: true,
            data_loaded: true,
            data_size,
        })
    }
}
