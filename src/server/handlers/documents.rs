use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::core::security::require_api_key;
use crate::pipeline::Document;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestPayload {
    pub documents: Vec<Document>,
}

pub async fn ingest_documents(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<IngestPayload>,
) -> Result<impl IntoResponse, ApiError> {
    require_api_key(&headers, state.api_key())?;
    let report = state.pipeline.process_documents(&payload.documents).await?;
    Ok(Json(report))
}
