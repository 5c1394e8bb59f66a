use async_trait::async_trait;

use crate::core::errors::ApiError;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// return the provider name (e.g. "openai-compatible")
    fn name(&self) -> &str;

    /// Encodes `inputs` in one logical call. Output order matches input order.
    async fn encode(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}
