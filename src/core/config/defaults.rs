use serde_json::{json, Value};

use super::paths::AppPaths;

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";
pub const DEFAULT_GENERATION_MODEL: &str = "llama-3.3-70b-versatile";

pub fn default_cors_origins() -> Vec<String> {
    vec![
        "https://acadmate-lac.vercel.app".to_string(),
        "http://localhost:5174".to_string(),
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:5173".to_string(),
    ]
}

/// Baseline configuration tree. File and environment layers are merged on top.
pub fn default_config(paths: &AppPaths) -> Value {
    json!({
        "server": {
            "host": "0.0.0.0",
            "port": 8000,
            "cors_allowed_origins": default_cors_origins(),
        },
        "logging": {
            "level": "info",
            "dir": paths.log_dir.to_string_lossy(),
        },
        "pinecone": {
            "index_name": "",
            "api_key": "",
            "control_plane_url": "https://api.pinecone.io",
        },
        "embedding": {
            "model_name": DEFAULT_EMBEDDING_MODEL,
            "device": "cpu",
            "batch_size": 32,
            "normalize": true,
            "api_base": "http://127.0.0.1:8080",
            "enable_cache": true,
            "cache_max_size": 1000,
        },
        "retrieval": {
            "default_top_k": 5,
            "max_top_k": 20,
        },
        "generation": {
            "api_base": "https://api.groq.com/openai",
            "api_key": "",
            "model": DEFAULT_GENERATION_MODEL,
            "temperature": 0.7,
            "max_tokens": 1024,
        },
    })
}
