use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use plan_chat_backend::core::config::{AppPaths, ConfigService};
use plan_chat_backend::core::logging;
use plan_chat_backend::import::{
    import_file, ImportOptions, DEFAULT_EMBEDDING_COLUMN, DEFAULT_TEXT_COLUMN,
};
use plan_chat_backend::rag::{SqliteVectorStore, VectorStore};

/// Import precomputed text + embedding rows into the plan collection.
#[derive(Debug, Parser)]
#[command(name = "plan-import", version)]
struct Cli {
    /// Spreadsheet to import (.xlsx, .xls, .ods or .csv)
    file: PathBuf,

    /// Column holding the passage text
    #[arg(long, default_value = DEFAULT_TEXT_COLUMN)]
    text_column: String,

    /// Column holding the serialized embedding
    #[arg(long, default_value = DEFAULT_EMBEDDING_COLUMN)]
    embedding_column: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_stdout();

    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    let config = ConfigService::new(paths.clone())
        .load_config()
        .context("Failed to load configuration")?;

    let store = SqliteVectorStore::new(&paths, &config.rag.collection)
        .await
        .with_context(|| format!("Failed to open {}", paths.store_path.display()))?;

    println!("Reading file: {}", cli.file.display());
    println!(
        "Collection: {} (documents before: {})",
        store.collection(),
        store.count().await?
    );

    let options = ImportOptions {
        text_column: cli.text_column,
        embedding_column: cli.embedding_column,
    };
    let report = import_file(&store, &cli.file, &options)
        .await
        .with_context(|| format!("Import of {} aborted", cli.file.display()))?;

    println!("Rows written: {}", report.rows);
    println!("Total documents now: {}", report.count_after);

    Ok(())
}
