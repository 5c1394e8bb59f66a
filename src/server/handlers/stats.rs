use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.pipeline.get_stats().await?))
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.embedding.clear_cache();
    Json(json!({"status": "success", "message": "Cache cleared"}))
}
