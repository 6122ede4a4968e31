use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QueryPayload {
    pub prompt: String,
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<QueryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, state.api_key())?;
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt cannot be empty".to_string()));
    }
    let answer = state.pipeline.query(&payload.prompt).await?;
    Ok(Json(json!({ "answer": answer })))
}
