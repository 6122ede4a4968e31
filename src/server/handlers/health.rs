use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let config = state.pipeline.config();
    Json(json!({
        "status": "ok",
        "collection": config.collection_name,
        "vector_dimension": config.vector_dimension,
    }))
}
