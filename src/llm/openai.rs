use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};

use super::error::LlmError;
use super::provider::Embedder;
use super::types::QueryRequest;
use crate::core::config::LlmSettings;

/// Client for OpenAI-compatible `/v1/embeddings` and `/v1/chat/completions`.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    chat_model: String,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    client: Client,
}

impl OpenAiClient {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|key| !key.trim().is_empty()),
            embedding_model: settings.embedding_model.clone(),
            chat_model: settings.chat_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            client: Client::new(),
        }
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.post(url);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

async fn read_json(res: Response) -> Result<Value, LlmError> {
    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        return Err(LlmError::Status { status, body });
    }

    res.json()
        .await
        .map_err(|err| LlmError::MalformedResponse(err.to_string()))
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn generate_embedding(&self, text: &str, dimension: usize) -> Result<Vec<f32>, LlmError> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
            "dimensions": dimension,
        });

        tracing::debug!(model = %self.embedding_model, dimension, "requesting embedding");
        let res = self.post("/v1/embeddings").json(&body).send().await?;
        let payload = read_json(res).await?;

        let data = payload["data"]
            .as_array()
            .ok_or_else(|| LlmError::MalformedResponse("missing `data` array".to_string()))?;

        let mut embedding = Vec::with_capacity(dimension);
        for item in data {
            let values = item["embedding"].as_array().ok_or_else(|| {
                LlmError::MalformedResponse("missing `embedding` values".to_string())
            })?;
            for value in values {
                let number = value.as_f64().ok_or_else(|| {
                    LlmError::MalformedResponse(format!("non-numeric embedding value: {}", value))
                })?;
                embedding.push(number as f32);
            }
        }

        Ok(embedding)
    }

    async fn send_query(&self, query: &QueryRequest) -> Result<String, LlmError> {
        let mut body = json!({
            "model": self.chat_model,
            "messages": query.to_messages(),
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(temperature) = self.temperature {
                obj.insert("temperature".to_string(), json!(temperature));
            }
            if let Some(max_tokens) = self.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
        }

        tracing::debug!(model = %self.chat_model, "requesting chat completion");
        let res = self.post("/v1/chat/completions").json(&body).send().await?;
        let payload = read_json(res).await?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::MalformedResponse("response has no choices".to_string()))
    }
}
