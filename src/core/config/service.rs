use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::default_config;
use super::paths::AppPaths;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "default_top_k", "max_top_k"];

#[derive(Clone, Copy)]
enum EnvKind {
    Str,
    Int,
    Float,
    Bool,
}

/// Environment variable -> (config path, value kind).
const ENV_BINDINGS: [(&str, &[&str], EnvKind); 23] = [
    ("API_HOST", &["server", "host"], EnvKind::Str),
    ("API_PORT", &["server", "port"], EnvKind::Int),
    ("LOG_LEVEL", &["logging", "level"], EnvKind::Str),
    ("RAG_LOG_DIR", &["logging", "dir"], EnvKind::Str),
    ("PINECONE_INDEX_NAME", &["pinecone", "index_name"], EnvKind::Str),
    ("PINECONE_INDEX_HOST", &["pinecone", "index_host"], EnvKind::Str),
    ("PINECONE_API_KEY", &["pinecone", "api_key"], EnvKind::Str),
    ("PINECONE_NAMESPACE", &["pinecone", "namespace"], EnvKind::Str),
    ("EMBEDDING_MODEL_NAME", &["embedding", "model_name"], EnvKind::Str),
    ("EMBEDDING_DEVICE", &["embedding", "device"], EnvKind::Str),
    ("EMBEDDING_BATCH_SIZE", &["embedding", "batch_size"], EnvKind::Int),
    ("NORMALIZE_EMBEDDINGS", &["embedding", "normalize"], EnvKind::Bool),
    ("EMBEDDING_API_BASE", &["embedding", "api_base"], EnvKind::Str),
    ("EMBEDDING_API_KEY", &["embedding", "api_key"], EnvKind::Str),
    ("ENABLE_CACHE", &["embedding", "enable_cache"], EnvKind::Bool),
    ("CACHE_MAX_SIZE", &["embedding", "cache_max_size"], EnvKind::Int),
    ("DEFAULT_TOP_K", &["retrieval", "default_top_k"], EnvKind::Int),
    ("MAX_TOP_K", &["retrieval", "max_top_k"], EnvKind::Int),
    ("GROQ_API_BASE", &["generation", "api_base"], EnvKind::Str),
    ("GROQ_API_KEY", &["generation", "api_key"], EnvKind::Str),
    ("GROQ_MODEL", &["generation", "model"], EnvKind::Str),
    ("GROQ_TEMPERATURE", &["generation", "temperature"], EnvKind::Float),
    ("GROQ_MAX_TOKENS", &["generation", "max_tokens"], EnvKind::Int),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("RAG_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        self.paths.project_root.join("config.yml")
    }

    /// Defaults <- YAML file <- process environment.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let env_layer = env_overrides(|name| env::var(name).ok())?;
        self.load_config_with(&env_layer)
    }

    pub fn load_config_with(&self, env_layer: &Value) -> Result<Value, ApiError> {
        let defaults = default_config(&self.paths);
        let file_config = load_yaml_file(&self.config_path())?;
        let merged = deep_merge(&deep_merge(&defaults, &file_config), env_layer);
        validate_config(&merged)?;
        Ok(merged)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(ApiError::internal)?;
    let value = serde_yaml::from_str::<Value>(&contents).map_err(|e| {
        ApiError::BadRequest(format!("Invalid config file {}: {}", path.display(), e))
    })?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ApiError::BadRequest(format!(
            "Invalid config file {}: expected a mapping at the root",
            path.display()
        ))),
    }
}

pub(crate) fn env_overrides<F>(lookup: F) -> Result<Value, ApiError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Value::Object(Map::new());
    for (name, path, kind) in ENV_BINDINGS {
        let Some(raw) = lookup(name) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = parse_env_value(name, raw, kind)?;
        ensure_object_path(&mut overrides, path, value);
    }

    Ok(overrides)
}

fn parse_env_value(name: &str, raw: &str, kind: EnvKind) -> Result<Value, ApiError> {
    let invalid = |expected: &str| {
        ApiError::BadRequest(format!(
            "Invalid environment variable {}: expected {}, got '{}'",
            name, expected, raw
        ))
    };
    match kind {
        EnvKind::Str => Ok(Value::String(raw.to_string())),
        EnvKind::Int => raw
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| invalid("a non-negative integer")),
        EnvKind::Float => raw
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| invalid("a number")),
        EnvKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(invalid("a boolean")),
        },
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
