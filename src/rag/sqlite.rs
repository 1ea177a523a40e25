//! SQLite-backed vector store.
//!
//! Documents and their embeddings live in one SQLite file; search is a
//! brute-force cosine scan over the collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqliteConnection, SqlitePool};

use super::store::{Document, ScoredDocument, StoreError, VectorStore};
use crate::core::config::AppPaths;
use crate::vector_math::cosine_similarity;

pub struct SqliteVectorStore {
    pool: SqlitePool,
    collection: String,
    db_path: PathBuf,
}

impl SqliteVectorStore {
    pub async fn new(paths: &AppPaths, collection: &str) -> Result<Self, StoreError> {
        Self::with_path(paths.store_path.clone(), collection).await
    }

    pub async fn with_path(db_path: PathBuf, collection: &str) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            collection: collection.to_string(),
            db_path,
        };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (collection, doc_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    async fn collection_dimension(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<Option<usize>, StoreError> {
        let dimension: Option<i64> =
            sqlx::query_scalar("SELECT dimension FROM collections WHERE name = ?1")
                .bind(&self.collection)
                .fetch_optional(conn)
                .await?;

        Ok(dimension.map(|d| d as usize))
    }

    /// Every document in a batch must carry an id and share one dimension.
    fn batch_dimension(documents: &[Document]) -> Result<usize, StoreError> {
        let mut dimension = None;
        for doc in documents {
            if doc.id.trim().is_empty() {
                return Err(StoreError::InvalidDocument(
                    "document id must not be empty".to_string(),
                ));
            }
            if doc.embedding.is_empty() {
                return Err(StoreError::InvalidDocument(format!(
                    "document {} has an empty embedding",
                    doc.id
                )));
            }
            match dimension {
                None => dimension = Some(doc.embedding.len()),
                Some(expected) if expected != doc.embedding.len() => {
                    return Err(StoreError::DimensionMismatch {
                        expected,
                        actual: doc.embedding.len(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(dimension.unwrap_or(0))
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn upsert(&self, documents: Vec<Document>) -> Result<usize, StoreError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let dimension = Self::batch_dimension(&documents)?;
        let mut tx = self.pool.begin().await?;

        match self.collection_dimension(&mut tx).await? {
            Some(expected) if expected != dimension => {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: dimension,
                });
            }
            Some(_) => {}
            None => {
                sqlx::query("INSERT INTO collections (name, dimension) VALUES (?1, ?2)")
                    .bind(&self.collection)
                    .bind(dimension as i64)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        for doc in &documents {
            let blob = Self::serialize_embedding(&doc.embedding);
            sqlx::query(
                "INSERT INTO documents (collection, doc_id, content, embedding)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(collection, doc_id) DO UPDATE SET
                    content = excluded.content,
                    embedding = excluded.embedding,
                    updated_at = STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')",
            )
            .bind(&self.collection)
            .bind(&doc.id)
            .bind(&doc.text)
            .bind(&blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(documents.len())
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredDocument>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;
        match self.collection_dimension(&mut conn).await? {
            None => return Ok(Vec::new()),
            Some(expected) if expected != embedding.len() => {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            Some(_) => {}
        }

        let rows = sqlx::query(
            "SELECT doc_id, content, embedding
             FROM documents
             WHERE collection = ?1",
        )
        .bind(&self.collection)
        .fetch_all(&mut *conn)
        .await?;

        let mut scored: Vec<ScoredDocument> = rows
            .iter()
            .map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                let stored = Self::deserialize_embedding(&embedding_bytes);
                ScoredDocument {
                    id: row.get("doc_id"),
                    text: row.get("content"),
                    score: cosine_similarity(embedding, &stored),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?1")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }
}
