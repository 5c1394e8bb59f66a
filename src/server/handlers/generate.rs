use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::validation::{
    json_body, require_non_empty, retrieval_options, validate_marks, validate_max_tokens,
    validate_temperature,
};
use crate::core::errors::ApiError;
use crate::llm::FragmentReceiver;
use crate::rag::{AnswerRequest, DEFAULT_MARKS};
use crate::state::AppState;

fn default_marks() -> i64 {
    DEFAULT_MARKS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub query: String,
    #[serde(default = "default_marks")]
    pub marks: i64,
    #[serde(default)]
    pub top_k: Option<i64>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub filter_metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub custom_system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
    #[serde(default = "default_true")]
    pub include_sources: bool,
}

impl GenerateRequest {
    fn into_answer_request(self) -> Result<AnswerRequest, ApiError> {
        require_non_empty("query", &self.query)?;
        Ok(AnswerRequest {
            marks: validate_marks(self.marks)?,
            retrieval: retrieval_options(self.top_k, self.namespace, self.filter_metadata)?,
            custom_system_prompt: self.custom_system_prompt,
            temperature: validate_temperature(self.temperature)?,
            max_tokens: validate_max_tokens(self.max_tokens)?,
            include_sources: self.include_sources,
            query: self.query,
        })
    }
}

pub async fn generate_answer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?.into_answer_request()?;
    let result = state.pipeline.generate_answer(&request).await?;
    Ok(Json(result))
}

pub async fn generate_answer_stream(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?.into_answer_request()?;
    let fragments = state.pipeline.generate_answer_stream(&request).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(fragment_stream(fragments)),
    )
        .into_response())
}

/// Ends the body at the first provider error; the client sees a truncated answer.
fn fragment_stream(
    rx: FragmentReceiver,
) -> impl futures_util::Stream<Item = Result<String, Infallible>> + Send {
    stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Some(Ok(fragment)) => Some((Ok(fragment), rx)),
            Some(Err(err)) => {
                tracing::error!("Error in streaming generation: {}", err);
                None
            }
            None => None,
        }
    })
}
