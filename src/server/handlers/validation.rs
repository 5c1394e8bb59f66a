use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use serde_json::{Map, Value};

use crate::core::errors::ApiError;
use crate::rag::RetrievalOptions;

pub const TOP_K_RANGE: (i64, i64) = (1, 20);
pub const MARKS_RANGE: (i64, i64) = (1, 20);
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// Malformed or mistyped bodies become 400s with the extractor's message.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub fn validate_top_k(top_k: Option<i64>) -> Result<Option<usize>, ApiError> {
    let Some(top_k) = top_k else {
        return Ok(None);
    };
    let (min, max) = TOP_K_RANGE;
    if !(min..=max).contains(&top_k) {
        return Err(ApiError::BadRequest(format!(
            "top_k must be between {} and {}",
            min, max
        )));
    }
    Ok(Some(top_k as usize))
}

pub fn validate_marks(marks: i64) -> Result<i64, ApiError> {
    let (min, max) = MARKS_RANGE;
    if !(min..=max).contains(&marks) {
        return Err(ApiError::BadRequest(format!(
            "marks must be between {} and {}",
            min, max
        )));
    }
    Ok(marks)
}

pub fn validate_temperature(temperature: Option<f64>) -> Result<Option<f64>, ApiError> {
    let Some(temperature) = temperature else {
        return Ok(None);
    };
    let (min, max) = TEMPERATURE_RANGE;
    if !(min..=max).contains(&temperature) {
        return Err(ApiError::BadRequest(format!(
            "temperature must be between {} and {}",
            min, max
        )));
    }
    Ok(Some(temperature))
}

pub fn validate_max_tokens(max_tokens: Option<i64>) -> Result<Option<u32>, ApiError> {
    let Some(max_tokens) = max_tokens else {
        return Ok(None);
    };
    if max_tokens < 1 {
        return Err(ApiError::BadRequest(
            "max_tokens must be at least 1".to_string(),
        ));
    }
    u32::try_from(max_tokens)
        .map(Some)
        .map_err(|_| ApiError::BadRequest("max_tokens is too large".to_string()))
}

pub fn retrieval_options(
    top_k: Option<i64>,
    namespace: Option<String>,
    filter_metadata: Option<Map<String, Value>>,
) -> Result<RetrievalOptions, ApiError> {
    Ok(RetrievalOptions {
        top_k: validate_top_k(top_k)?,
        namespace,
        filter: filter_metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_bounds() {
        assert_eq!(validate_top_k(None).unwrap(), None);
        assert_eq!(validate_top_k(Some(1)).unwrap(), Some(1));
        assert_eq!(validate_top_k(Some(20)).unwrap(), Some(20));
        assert!(validate_top_k(Some(0)).is_err());
        assert!(validate_top_k(Some(21)).is_err());
        assert!(validate_top_k(Some(-1)).is_err());
    }

    #[test]
    fn marks_bounds() {
        assert!(validate_marks(0).is_err());
        assert_eq!(validate_marks(6).unwrap(), 6);
        assert_eq!(validate_marks(20).unwrap(), 20);
        assert!(validate_marks(21).is_err());
    }

    #[test]
    fn temperature_bounds() {
        assert_eq!(validate_temperature(Some(0.0)).unwrap(), Some(0.0));
        assert_eq!(validate_temperature(Some(2.0)).unwrap(), Some(2.0));
        assert!(validate_temperature(Some(2.01)).is_err());
        assert!(validate_temperature(Some(-0.1)).is_err());
        assert!(validate_temperature(Some(f64::NAN)).is_err());
    }

    #[test]
    fn max_tokens_bounds() {
        assert_eq!(validate_max_tokens(Some(1)).unwrap(), Some(1));
        assert!(validate_max_tokens(Some(0)).is_err());
        assert!(validate_max_tokens(Some(i64::MAX)).is_err());
    }

    #[test]
    fn empty_strings_are_rejected() {
        let err = require_non_empty("query", "").unwrap_err();
        assert_eq!(err.to_string(), "bad request: query must not be empty");
        assert!(require_non_empty("query", " ").is_ok());
    }
}
