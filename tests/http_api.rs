//! HTTP-level tests: the full router over stub model clients and a real
//! SQLite collection in a temp dir.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use plan_chat_backend::core::config::AppConfig;
use plan_chat_backend::llm::{ChatRequest, CompletionProvider, EmbeddingProvider, ProviderError};
use plan_chat_backend::rag::{Document, RagPipeline, SqliteVectorStore, VectorStore};
use plan_chat_backend::server::router::router;
use plan_chat_backend::state::error::InitializationError;
use plan_chat_backend::state::{AppState, ComponentLoader, InitOutcome};

/// Maps a query onto the axis named by its last letter (A, B or C).
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn model(&self) -> &str {
        "keyword"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let embedding = match text.trim().trim_end_matches('?').chars().last() {
            Some('A') => vec![1.0, 0.1, 0.0],
            Some('B') => vec![0.1, 1.0, 0.0],
            Some('C') => vec![0.0, 0.1, 1.0],
            _ => return Err(ProviderError::Transient("embedding service unreachable".into())),
        };
        Ok(embedding)
    }
}

/// Replies with the user message it was given.
struct EchoCompletion;

#[async_trait]
impl CompletionProvider for EchoCompletion {
    fn model(&self) -> &str {
        "echo"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ProviderError> {
        Ok(request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }
}

struct StubLoader {
    dir: tempfile::TempDir,
    loads: AtomicUsize,
    fail_first: bool,
}

impl StubLoader {
    fn new(fail_first: bool) -> Arc<Self> {
        Arc::new(Self {
            dir: tempfile::tempdir().unwrap(),
            loads: AtomicUsize::new(0),
            fail_first,
        })
    }
}

#[async_trait]
impl ComponentLoader for StubLoader {
    async fn load(&self) -> Result<RagPipeline, InitializationError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.fail_first && attempt == 0 {
            return Err(InitializationError::Provider(ProviderError::Auth(
                "API key not valid".into(),
            )));
        }

        let store = SqliteVectorStore::with_path(self.dir.path().join("store.db"), "plan")
            .await
            .map_err(InitializationError::Store)?;
        store
            .upsert(vec![
                Document::new("plan.xlsx_0", "A", vec![1.0, 0.0, 0.0]),
                Document::new("plan.xlsx_1", "B", vec![0.0, 1.0, 0.0]),
                Document::new("plan.xlsx_2", "C", vec![0.0, 0.0, 1.0]),
            ])
            .await
            .map_err(InitializationError::Store)?;

        Ok(RagPipeline::new(
            Arc::new(KeywordEmbedder),
            Arc::new(store),
            Arc::new(EchoCompletion),
        ))
    }
}

fn test_state(loader: Arc<StubLoader>) -> Arc<AppState> {
    AppState::new(Arc::new(AppConfig::default()), loader)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn status_before_initialize_is_all_false() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "embeddings_model_loaded": false,
            "chain_loaded": false,
            "data_loaded": false,
            "data_size": 0
        })
    );
}

#[tokio::test]
async fn chat_before_initialize_is_an_initialization_error() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);

    let (status, body) = send(&app, "POST", "/chat", Some(json!({ "query": "¿Qué dice B?" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("not been initialized"));
}

#[tokio::test]
async fn chat_without_query_is_rejected() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);

    let (status, body) = send(&app, "POST", "/chat", Some(json!({ "top_k": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("query"));

    let (status, _) = send(&app, "POST", "/chat", Some(json!({ "query": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/chat", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn initialize_then_chat_uses_nearest_passages() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);

    let (status, body) = send(&app, "POST", "/initialize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "System initialized successfully");

    let (status, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chain_loaded"], true);
    assert_eq!(body["data_size"], 3);

    let (status, body) = send(
        &app,
        "POST",
        "/chat",
        Some(json!({ "query": "¿Qué dice B?", "top_k": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passages_used"], 1);
    let response = body["response"].as_str().unwrap();
    assert!(response.contains("CONSULTA: ¿Qué dice B?"));
    assert!(response.contains("ESTATAL:\nB\n\nRESPUESTA:"));

    let (_, body) = send(&app, "POST", "/chat", Some(json!({ "query": "¿Qué dice C?" }))).await;
    assert_eq!(body["passages_used"], 3);
    assert!(body["response"]
        .as_str()
        .unwrap()
        .contains("ESTATAL:\nC\n\n"));
}

#[tokio::test]
async fn upstream_failure_passes_message_through() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);
    send(&app, "POST", "/initialize", None).await;

    let (status, body) = send(&app, "POST", "/chat", Some(json!({ "query": "hola" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("embedding service unreachable"));
}

#[tokio::test]
async fn out_of_range_top_k_is_rejected() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);
    send(&app, "POST", "/initialize", None).await;

    let (status, _) = send(
        &app,
        "POST",
        "/chat",
        Some(json!({ "query": "¿Qué dice A?", "top_k": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn top_k_above_collection_size_uses_every_passage() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);
    send(&app, "POST", "/initialize", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/chat",
        Some(json!({ "query": "¿Qué dice A?", "top_k": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["passages_used"], 3);
}

#[tokio::test]
async fn query_reaches_the_prompt_untrimmed() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);
    send(&app, "POST", "/initialize", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/chat",
        Some(json!({ "query": "  ¿Qué dice B?\n", "top_k": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("CONSULTA:   ¿Qué dice B?\n\n\nINFORMACIÓN"));
}

#[tokio::test]
async fn repeated_initialize_reports_already_initialized() {
    let loader = StubLoader::new(false);
    let state = test_state(loader.clone());
    let app = router(state);

    send(&app, "POST", "/initialize", None).await;
    let (status, body) = send(&app, "POST", "/initialize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "System was already initialized");
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_initialize_builds_once() {
    let loader = StubLoader::new(false);
    let state = test_state(loader.clone());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            tokio::spawn(async move { state.initialize().await.unwrap() })
        })
        .collect();

    let mut initialized = 0;
    for handle in handles {
        if handle.await.unwrap() == InitOutcome::Initialized {
            initialized += 1;
        }
    }

    assert_eq!(initialized, 1);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert!(state.is_initialized());
}

#[tokio::test]
async fn failed_initialize_can_be_retried() {
    let loader = StubLoader::new(true);
    let state = test_state(loader.clone());
    let app = router(state);

    let (status, body) = send(&app, "POST", "/initialize", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("API key not valid"));

    let (_, body) = send(&app, "GET", "/status", None).await;
    assert_eq!(body["chain_loaded"], false);

    let (status, _) = send(&app, "POST", "/initialize", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn health_reports_ok() {
    let state = test_state(StubLoader::new(false));
    let app = router(state);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
