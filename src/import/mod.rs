//! Bulk import of precomputed (text, embedding) rows into the vector store.

pub mod sheet;

use std::path::Path;

use thiserror::Error;

use crate::rag::{Document, StoreError, VectorStore};
use sheet::read_table;

pub const DEFAULT_TEXT_COLUMN: &str = "Text";
pub const DEFAULT_EMBEDDING_COLUMN: &str = "Embeddings";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type {0:?}; expected .xlsx, .xls, .ods or .csv")]
    UnsupportedFormat(String),
    #[error("failed to read spreadsheet: {0}")]
    Read(String),
    #[error("the spreadsheet has no header row")]
    EmptySheet,
    #[error("column {column:?} not found (available: {available})")]
    MissingColumn { column: String, available: String },
    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
    #[error("vector store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub text_column: String,
    pub embedding_column: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            embedding_column: DEFAULT_EMBEDDING_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub collection: String,
    pub rows: usize,
    pub count_before: usize,
    pub count_after: usize,
}

/// `{file_name}_{row_index}`; the row index is 0-based and excludes the header.
pub fn document_id(file_name: &str, row_index: usize) -> String {
    format!("{}_{}", file_name, row_index)
}

/// Parses a serialized vector such as `[0.12, -0.5, 1e-05]` or `(1, 2)`.
pub fn parse_embedding(raw: &str) -> Result<Vec<f32>, String> {
    let trimmed = raw.trim();
    let normalized = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => format!("[{}]", inner.trim().trim_end_matches(',')),
        None => trimmed.to_string(),
    };

    let values: Vec<f64> = serde_json::from_str(&normalized)
        .map_err(|e| format!("embedding is not a numeric list ({})", e))?;

    if values.is_empty() {
        return Err("embedding is empty".to_string());
    }

    values
        .into_iter()
        .map(|v| {
            let f = v as f32;
            if f.is_finite() {
                Ok(f)
            } else {
                Err(format!("embedding value {} is out of range", v))
            }
        })
        .collect()
}

/// Reads every row of `path` into documents. Nothing is written; any bad row
/// fails the whole file.
pub fn load_documents(path: &Path, options: &ImportOptions) -> Result<Vec<Document>, ImportError> {
    let table = read_table(path)?;

    let missing = |column: &str| ImportError::MissingColumn {
        column: column.to_string(),
        available: table.headers.join(", "),
    };
    let text_idx = table
        .column(&options.text_column)
        .ok_or_else(|| missing(&options.text_column))?;
    let embedding_idx = table
        .column(&options.embedding_column)
        .ok_or_else(|| missing(&options.embedding_column))?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let data_rows = table
        .rows
        .iter()
        .filter(|row| row.iter().any(|cell| cell.as_deref().is_some_and(|c| !c.trim().is_empty())));

    let mut documents = Vec::new();
    for (row_index, row) in data_rows.enumerate() {
        let cell = |idx: usize| row.get(idx).and_then(|c| c.as_deref());

        let text = cell(text_idx)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ImportError::InvalidRow {
                row: row_index,
                reason: format!("column {:?} is empty", options.text_column),
            })?;
        let raw_embedding = cell(embedding_idx).ok_or_else(|| ImportError::InvalidRow {
            row: row_index,
            reason: format!("column {:?} is empty", options.embedding_column),
        })?;
        let embedding = parse_embedding(raw_embedding).map_err(|reason| ImportError::InvalidRow {
            row: row_index,
            reason,
        })?;

        documents.push(Document::new(
            document_id(&file_name, row_index),
            text,
            embedding,
        ));
    }

    Ok(documents)
}

/// Loads `path` and upserts all rows in one batch.
pub async fn import_file(
    store: &dyn VectorStore,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportReport, ImportError> {
    let documents = load_documents(path, options)?;
    let count_before = store.count().await?;
    tracing::info!(
        file = %path.display(),
        rows = documents.len(),
        collection = store.collection(),
        count_before,
        "importing rows"
    );

    let rows = store.upsert(documents).await?;
    let count_after = store.count().await?;

    Ok(ImportReport {
        collection: store.collection().to_string(),
        rows,
        count_before,
        count_after,
    })
}
