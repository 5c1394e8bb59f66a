use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::ApiError;

/// Typed view of the merged configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub pinecone: PineconeSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeSettings {
    pub index_name: String,
    #[serde(default)]
    pub index_host: Option<String>,
    pub api_key: String,
    #[serde(default)]
    pub namespace: Option<String>,
    pub control_plane_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub model_name: String,
    pub device: String,
    pub batch_size: usize,
    pub normalize: bool,
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub enable_cache: bool,
    pub cache_max_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub default_top_k: usize,
    pub max_top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Settings {
    pub fn from_value(config: Value) -> Result<Self, ApiError> {
        serde_json::from_value(config)
            .map_err(|e| ApiError::BadRequest(format!("Invalid config: {}", e)))
    }
}
