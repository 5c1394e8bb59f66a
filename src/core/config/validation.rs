use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65_535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(logging) = expect_optional_object(root, "logging")? {
        validate_optional_string_field(logging, "logging.level", "level")?;
        validate_optional_string_field(logging, "logging.dir", "dir")?;
    }

    if let Some(pinecone) = expect_optional_object(root, "pinecone")? {
        validate_optional_string_field(pinecone, "pinecone.index_name", "index_name")?;
        validate_optional_string_field(pinecone, "pinecone.index_host", "index_host")?;
        validate_optional_string_field(pinecone, "pinecone.namespace", "namespace")?;
        validate_optional_string_field(
            pinecone,
            "pinecone.control_plane_url",
            "control_plane_url",
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_required_string_field(embedding, "embedding.model_name", "model_name")?;
        validate_optional_string_field(embedding, "embedding.device", "device")?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 4_096)?;
        validate_bool_field(embedding, "embedding.normalize", "normalize")?;
        validate_required_string_field(embedding, "embedding.api_base", "api_base")?;
        validate_bool_field(embedding, "embedding.enable_cache", "enable_cache")?;
        validate_u64_field(
            embedding,
            "embedding.cache_max_size",
            "cache_max_size",
            1,
            10_000_000,
        )?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.default_top_k", "default_top_k", 1, 10_000)?;
        validate_u64_field(retrieval, "retrieval.max_top_k", "max_top_k", 1, 10_000)?;
        let default_top_k = retrieval.get("default_top_k").and_then(|v| v.as_u64());
        let max_top_k = retrieval.get("max_top_k").and_then(|v| v.as_u64());
        if let (Some(default_top_k), Some(max_top_k)) = (default_top_k, max_top_k) {
            if default_top_k > max_top_k {
                return Err(ApiError::BadRequest(format!(
                    "Invalid config at 'retrieval.default_top_k': {} exceeds max_top_k {}",
                    default_top_k, max_top_k
                )));
            }
        }
    }

    if let Some(generation) = expect_optional_object(root, "generation")? {
        validate_required_string_field(generation, "generation.api_base", "api_base")?;
        validate_required_string_field(generation, "generation.model", "model")?;
        validate_f64_field(generation, "generation.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(
            generation,
            "generation.max_tokens",
            "max_tokens",
            1,
            1_000_000,
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_tree() {
        assert!(validate_config(&json!({})).is_ok());
    }

    #[test]
    fn rejects_non_object_section() {
        let err = validate_config(&json!({ "retrieval": 5 })).unwrap_err();
        assert!(err.to_string().contains("retrieval"));
    }

    #[test]
    fn rejects_default_top_k_above_max() {
        let err = validate_config(&json!({
            "retrieval": { "default_top_k": 30, "max_top_k": 20 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("retrieval.default_top_k"));
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let err = validate_config(&json!({
            "generation": {
                "api_base": "https://example.test",
                "model": "m",
                "temperature": 2.5
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("generation.temperature"));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let err = validate_config(&json!({
            "embedding": {
                "model_name": "m",
                "api_base": "http://localhost",
                "batch_size": 0
            }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("embedding.batch_size"));
    }

    #[test]
    fn rejects_blank_cors_origin() {
        let err = validate_config(&json!({
            "server": { "cors_allowed_origins": ["http://localhost", "  "] }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cors_allowed_origins[1]"));
    }
}
