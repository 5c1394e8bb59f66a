use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::validation::{json_body, require_non_empty, retrieval_options};
use crate::core::errors::ApiError;
use crate::state::AppState;

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub filter_metadata: Option<Map<String, Value>>,
    #[serde(default = "default_true")]
    pub include_context: bool,
    #[serde(default)]
    pub include_scores: bool,
}

#[derive(Debug, Deserialize)]
pub struct BatchQueryRequest {
    pub queries: Vec<String>,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub filter_metadata: Option<Map<String, Value>>,
}

pub async fn query_documents(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    require_non_empty("query", &request.query)?;
    let options = retrieval_options(request.top_k, request.namespace, request.filter_metadata)?;

    let result = state
        .pipeline
        .run(
            &request.query,
            &options,
            request.include_context,
            request.include_scores,
        )
        .await?;

    Ok(Json(result))
}

pub async fn batch_query_documents(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchQueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    if request.queries.is_empty() {
        return Err(ApiError::BadRequest(
            "queries must contain at least one query".to_string(),
        ));
    }
    let options = retrieval_options(request.top_k, request.namespace, request.filter_metadata)?;

    let results = state
        .pipeline
        .retrieve_batch(&request.queries, &options)
        .await?;

    Ok(Json(json!({
        "num_queries": request.queries.len(),
        "queries": request.queries,
        "results": results,
    })))
}
