//! Qdrant document store over the REST API.
//!
//! Points carry the document text in a `text` payload field; vectors use
//! cosine distance.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use super::store::{join_hits, DocumentStore, StoreError};
use crate::core::config::StoreSettings;

const API_KEY_HEADER: &str = "api-key";

#[derive(Clone)]
pub struct QdrantDocumentStore {
    base_url: String,
    api_key: Option<String>,
    top_k: usize,
    client: Client,
}

#[derive(Deserialize)]
struct CollectionInfoResponse {
    result: CollectionInfo,
}

#[derive(Deserialize)]
struct CollectionInfo {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    vectors: VectorParams,
}

#[derive(Deserialize)]
struct VectorParams {
    size: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    payload: Option<Value>,
}

impl QdrantDocumentStore {
    pub fn new(settings: &StoreSettings) -> Self {
        Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|key| !key.trim().is_empty()),
            top_k: settings.top_k.max(1),
            client: Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        request.send().await.map_err(StoreError::backend)
    }
}

/// `/collections/{name}{suffix}` with the name encoded as a single path segment.
fn collection_path(name: &str, suffix: &str) -> String {
    format!("/collections/{}{}", urlencoding::encode(name), suffix)
}

async fn error_for(res: Response) -> StoreError {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    StoreError::Backend(format!("qdrant returned {}: {}", status, body))
}

#[async_trait]
impl DocumentStore for QdrantDocumentStore {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<(), StoreError> {
        let path = collection_path(name, "");

        let res = self.send(self.request(reqwest::Method::GET, &path)).await?;
        if res.status().is_success() {
            let info: CollectionInfoResponse = res.json().await.map_err(StoreError::backend)?;
            let existing = info.result.config.params.vectors.size;
            if existing != dimension {
                return Err(StoreError::DimensionMismatch {
                    expected: existing,
                    actual: dimension,
                });
            }
            return Err(StoreError::CollectionExists(name.to_string()));
        }
        if res.status() != StatusCode::NOT_FOUND {
            return Err(error_for(res).await);
        }

        let body = json!({
            "vectors": { "size": dimension, "distance": "Cosine" }
        });
        let res = self
            .send(self.request(reqwest::Method::PUT, &path).json(&body))
            .await?;
        match res.status() {
            status if status.is_success() => {
                tracing::info!("Collection {} created with dimension {}", name, dimension);
                Ok(())
            }
            // Lost a creation race with another client.
            StatusCode::CONFLICT => Err(StoreError::CollectionExists(name.to_string())),
            _ => Err(error_for(res).await),
        }
    }

    async fn exists(&self, collection: &str, id: u64) -> Result<bool, StoreError> {
        let path = collection_path(collection, &format!("/points/{}", id));
        let res = self.send(self.request(reqwest::Method::GET, &path)).await?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !res.status().is_success() {
            return Err(error_for(res).await);
        }

        let payload: Value = res.json().await.map_err(StoreError::backend)?;
        Ok(!payload["result"].is_null())
    }

    async fn add_document(
        &self,
        collection: &str,
        id: u64,
        text: &str,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError> {
        let path = collection_path(collection, "/points?wait=true");
        let body = json!({
            "points": [{
                "id": id,
                "vector": embedding,
                "payload": { "text": text },
            }]
        });

        let res = self
            .send(self.request(reqwest::Method::PUT, &path).json(&body))
            .await?;
        if !res.status().is_success() {
            return Err(error_for(res).await);
        }
        Ok(())
    }

    async fn search(&self, collection: &str, embedding: &[f32]) -> Result<String, StoreError> {
        let path = collection_path(collection, "/points/search");
        let body = json!({
            "vector": embedding,
            "limit": self.top_k,
            "with_payload": true,
        });

        let res = self
            .send(self.request(reqwest::Method::POST, &path).json(&body))
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionNotFound(collection.to_string()));
        }
        if !res.status().is_success() {
            return Err(error_for(res).await);
        }

        let response: SearchResponse = res.json().await.map_err(StoreError::backend)?;
        let texts: Vec<&str> = response
            .result
            .iter()
            .filter_map(|point| point.payload.as_ref()?.get("text")?.as_str())
            .collect();

        tracing::debug!(
            "Retrieved {} documents from collection {}",
            texts.len(),
            collection
        );
        Ok(join_hits(texts))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post, put};
    use axum::{Json, Router};

    use super::*;

    #[derive(Default)]
    struct FakeQdrant {
        collections: HashMap<String, usize>,
        points: BTreeMap<(String, u64), String>,
        create_calls: usize,
        last_limit: Option<u64>,
        api_keys: Vec<Option<String>>,
    }

    type Shared = Arc<Mutex<FakeQdrant>>;

    async fn get_collection(
        State(state): State<Shared>,
        headers: HeaderMap,
        Path(name): Path<String>,
    ) -> (StatusCode, Json<Value>) {
        let mut fake = state.lock().unwrap();
        fake.api_keys.push(
            headers
                .get("api-key")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        );
        match fake.collections.get(&name) {
            Some(size) => (
                StatusCode::OK,
                Json(json!({
                    "result": { "config": { "params": { "vectors": { "size": size, "distance": "Cosine" } } } }
                })),
            ),
            None => (StatusCode::NOT_FOUND, Json(json!({ "status": { "error": "Not found" } }))),
        }
    }

    async fn put_collection(
        State(state): State<Shared>,
        Path(name): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let mut fake = state.lock().unwrap();
        fake.create_calls += 1;
        let size = body["vectors"]["size"].as_u64().unwrap() as usize;
        fake.collections.insert(name, size);
        Json(json!({ "result": true }))
    }

    async fn upsert_points(
        State(state): State<Shared>,
        Path(name): Path<String>,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let mut fake = state.lock().unwrap();
        for point in body["points"].as_array().unwrap() {
            let id = point["id"].as_u64().unwrap();
            let text = point["payload"]["text"].as_str().unwrap().to_string();
            fake.points.insert((name.clone(), id), text);
        }
        Json(json!({ "result": { "status": "completed" } }))
    }

    async fn get_point(
        State(state): State<Shared>,
        Path((name, id)): Path<(String, u64)>,
    ) -> (StatusCode, Json<Value>) {
        let fake = state.lock().unwrap();
        match fake.points.get(&(name, id)) {
            Some(text) => (
                StatusCode::OK,
                Json(json!({ "result": { "id": id, "payload": { "text": text } } })),
            ),
            None => (StatusCode::NOT_FOUND, Json(json!({ "status": { "error": "Not found" } }))),
        }
    }

    async fn search_points(
        State(state): State<Shared>,
        Path(name): Path<String>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let mut fake = state.lock().unwrap();
        if !fake.collections.contains_key(&name) {
            return (StatusCode::NOT_FOUND, Json(json!({ "status": { "error": "Not found" } })));
        }
        let limit = body["limit"].as_u64().unwrap();
        fake.last_limit = Some(limit);
        let hits: Vec<Value> = fake
            .points
            .iter()
            .filter(|((collection, _), _)| *collection == name)
            .take(limit as usize)
            .map(|((_, id), text)| json!({ "id": id, "score": 0.9, "payload": { "text": text } }))
            .collect();
        (StatusCode::OK, Json(json!({ "result": hits })))
    }

    async fn spawn_fake() -> (Shared, String) {
        let state: Shared = Arc::default();
        let router = Router::new()
            .route("/collections/:name", get(get_collection).put(put_collection))
            .route("/collections/:name/points", put(upsert_points))
            .route("/collections/:name/points/search", post(search_points))
            .route("/collections/:name/points/:id", get(get_point))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (state, format!("http://{}", addr))
    }

    fn store_for(url: String, api_key: Option<&str>, top_k: usize) -> QdrantDocumentStore {
        QdrantDocumentStore::new(&StoreSettings {
            url,
            api_key: api_key.map(str::to_string),
            top_k,
            ..StoreSettings::default()
        })
    }

    #[tokio::test]
    async fn create_collection_creates_once_then_reports_existing() {
        let (state, url) = spawn_fake().await;
        let store = store_for(url, Some("qdrant-key"), 3);

        store.create_collection("docs", 4).await.unwrap();
        let again = store.create_collection("docs", 4).await.unwrap_err();
        let mismatch = store.create_collection("docs", 8).await.unwrap_err();

        assert!(again.is_already_exists());
        assert!(matches!(
            mismatch,
            StoreError::DimensionMismatch { expected: 4, actual: 8 }
        ));
        let fake = state.lock().unwrap();
        assert_eq!(fake.create_calls, 1);
        assert_eq!(fake.collections.get("docs"), Some(&4));
        assert!(fake
            .api_keys
            .iter()
            .all(|key| key.as_deref() == Some("qdrant-key")));
    }

    #[tokio::test]
    async fn exists_add_and_search_round_through_payload_text() {
        let (state, url) = spawn_fake().await;
        let store = store_for(url, None, 2);
        store.create_collection("docs", 2).await.unwrap();

        assert!(!store.exists("docs", 1).await.unwrap());
        store.add_document("docs", 1, "Go is typed", vec![1.0, 0.0]).await.unwrap();
        store.add_document("docs", 2, "RAG grounds LLMs", vec![0.0, 1.0]).await.unwrap();
        store.add_document("docs", 3, "Vectors", vec![0.5, 0.5]).await.unwrap();
        assert!(store.exists("docs", 1).await.unwrap());

        let result = store.search("docs", &[1.0, 0.0]).await.unwrap();

        assert_eq!(result, "Go is typed\nRAG grounds LLMs\n");
        assert_eq!(state.lock().unwrap().last_limit, Some(2));
    }

    #[tokio::test]
    async fn reserved_characters_stay_inside_the_collection_segment() {
        let (state, url) = spawn_fake().await;
        let store = store_for(url, None, 3);

        store.create_collection("kb#2", 3).await.unwrap();
        store.create_collection("team/a", 2).await.unwrap();
        store
            .add_document("team/a", 7, "scoped", vec![1.0, 0.0])
            .await
            .unwrap();

        assert!(store.exists("team/a", 7).await.unwrap());
        assert!(!store.exists("team", 7).await.unwrap());
        let fake = state.lock().unwrap();
        assert_eq!(fake.collections.get("kb#2"), Some(&3));
        assert!(!fake.collections.contains_key("kb"));
        assert!(fake.points.contains_key(&("team/a".to_string(), 7)));
    }

    #[tokio::test]
    async fn search_on_missing_collection_is_not_found() {
        let (_state, url) = spawn_fake().await;
        let store = store_for(url, None, 3);

        let err = store.search("missing", &[1.0]).await.unwrap_err();

        assert!(matches!(err, StoreError::CollectionNotFound(_)));
    }
}
