use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub const SERVICE_NAME: &str = "RAG API";
pub const SERVICE_VERSION: &str = "1.0.0";

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION
    }))
}
