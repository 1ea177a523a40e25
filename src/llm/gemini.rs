//! Google Gemini REST client (`embedContent` and `generateContent`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{CompletionProvider, EmbeddingProvider, ProviderError};
use super::types::ChatRequest;
use crate::core::config::ModelsConfig;
use crate::core::security::Credentials;

const API_KEY_HEADER: &str = "x-goog-api-key";
const QUERY_TASK_TYPE: &str = "RETRIEVAL_QUERY";

#[derive(Clone)]
struct GeminiHttp {
    base_url: String,
    api_key: String,
    client: Client,
}

impl GeminiHttp {
    fn new(config: &ModelsConfig, credentials: &Credentials) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: credentials.api_key().to_string(),
            client,
        })
    }

    async fn post(&self, resource: &str, method: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}/{}:{}", self.base_url, resource, method);

        let res = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }

        Ok(res.json::<Value>().await?)
    }
}

/// Model names may be given with or without the `models/` prefix.
pub fn model_resource(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

pub struct GeminiEmbeddings {
    http: GeminiHttp,
    model: String,
}

impl GeminiEmbeddings {
    pub fn new(config: &ModelsConfig, credentials: &Credentials) -> Result<Self, ProviderError> {
        Ok(Self {
            http: GeminiHttp::new(config, credentials)?,
            model: model_resource(&config.embedding_model),
        })
    }
}

fn build_embed_body(model: &str, text: &str) -> Value {
    json!({
        "model": model,
        "content": { "parts": [{ "text": text }] },
        "taskType": QUERY_TASK_TYPE,
    })
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, ProviderError> {
    let values = payload["embedding"]["values"]
        .as_array()
        .ok_or_else(|| ProviderError::InvalidResponse("missing embedding.values".to_string()))?;

    let embedding: Vec<f32> = values
        .iter()
        .filter_map(|v| v.as_f64().map(|f| f as f32))
        .collect();

    if embedding.is_empty() || embedding.len() != values.len() {
        return Err(ProviderError::InvalidResponse(
            "embedding.values is empty or not numeric".to_string(),
        ));
    }

    Ok(embedding)
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let body = build_embed_body(&self.model, text);
        let payload = self.http.post(&self.model, "embedContent", &body).await?;
        parse_embedding(&payload)
    }
}

pub struct GeminiChat {
    http: GeminiHttp,
    model: String,
    temperature: f64,
}

impl GeminiChat {
    pub fn new(config: &ModelsConfig, credentials: &Credentials) -> Result<Self, ProviderError> {
        Ok(Self {
            http: GeminiHttp::new(config, credentials)?,
            model: model_resource(&config.chat_model),
            temperature: config.temperature,
        })
    }
}

fn text_part(text: &str) -> Value {
    json!({ "parts": [{ "text": text }] })
}

fn build_generate_body(request: &ChatRequest, temperature: f64) -> Value {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for message in &request.messages {
        match message.role.as_str() {
            "system" => system_parts.push(message.content.as_str()),
            role => {
                let role = if role == "assistant" { "model" } else { "user" };
                let mut content = text_part(&message.content);
                content["role"] = json!(role);
                contents.push(content);
            }
        }
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": { "temperature": temperature },
    });

    if !system_parts.is_empty() {
        body["systemInstruction"] = text_part(&system_parts.join("\n\n"));
    }

    body
}

fn parse_generate_response(payload: &Value) -> Result<String, ProviderError> {
    let Some(candidate) = payload["candidates"].as_array().and_then(|c| c.first()) else {
        let reason = payload["promptFeedback"]["blockReason"]
            .as_str()
            .unwrap_or("no candidates returned");
        return Err(ProviderError::InvalidResponse(format!(
            "empty completion ({})",
            reason
        )));
    };

    let text: String = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter(|part| !part["thought"].as_bool().unwrap_or(false))
                .filter_map(|part| part["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate["finishReason"].as_str().unwrap_or("unknown");
        return Err(ProviderError::InvalidResponse(format!(
            "completion has no text (finishReason: {})",
            reason
        )));
    }

    Ok(text)
}

#[async_trait]
impl CompletionProvider for GeminiChat {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let body = build_generate_body(&request, self.temperature);
        let payload = self.http.post(&self.model, "generateContent", &body).await?;
        parse_generate_response(&payload)
    }
}
