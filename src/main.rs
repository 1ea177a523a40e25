use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use plan_chat_backend::core::config::{AppPaths, ConfigService};
use plan_chat_backend::core::logging;
use plan_chat_backend::core::security::Credentials;
use plan_chat_backend::server;
use plan_chat_backend::state::{AppState, GeminiLoader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let credentials = Credentials::from_env()?;
    tracing::info!("API key configured: {}", credentials.redacted());

    let config_service = ConfigService::new(paths.clone());
    let config = Arc::new(
        config_service
            .load_config()
            .with_context(|| format!("Failed to load {}", config_service.config_path().display()))?,
    );

    let loader = Arc::new(GeminiLoader::new(paths.clone(), config.clone(), credentials));
    let state = AppState::new(config.clone(), loader);

    if config.app.initialize_on_startup {
        state
            .initialize()
            .await
            .context("Startup initialization failed")?;
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
