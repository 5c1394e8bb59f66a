use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::validation::query_params;
use crate::core::errors::ApiError;
use crate::state::AppState;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct EmbedParams {
    pub text: String,
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

pub async fn embed_text(
    State(state): State<Arc<AppState>>,
    params: Result<Query<EmbedParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(params)?;

    let embedding = if params.use_cache {
        state.embedding.embed_single(&params.text).await?
    } else {
        state.embedding.embed_uncached(&params.text).await?
    };

    Ok(Json(json!({
        "text": params.text,
        "dimension": embedding.len(),
        "embedding": &*embedding,
        "model": state.embedding.model_name(),
    })))
}
