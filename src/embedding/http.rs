use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::provider::EmbeddingProvider;
use crate::core::errors::ApiError;

const PROVIDER: &str = "embedding";

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint (text-embeddings-inference,
/// Ollama, LM Studio, ...). Large inputs are sent in `batch_size` slices.
#[derive(Clone)]
pub struct HttpEmbeddingProvider {
    base_url: String,
    api_key: Option<String>,
    batch_size: usize,
    client: Client,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(base_url: String, api_key: Option<String>, batch_size: usize) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
            batch_size: batch_size.max(1),
            client: Client::new(),
        }
    }

    async fn encode_slice(
        &self,
        inputs: &[String],
        model_id: &str,
    ) -> Result<Vec<Vec<f32>>, ApiError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .map_err(|e| ApiError::provider(PROVIDER, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::provider(
                PROVIDER,
                format!("encode failed ({}): {}", status, text),
            ));
        }

        let payload: EmbeddingsResponse = res
            .json()
            .await
            .map_err(|e| ApiError::provider(PROVIDER, e))?;

        order_embeddings(payload.data, inputs.len())
    }
}

/// Places each item at its reported index; items without one keep arrival order.
fn order_embeddings(items: Vec<EmbeddingItem>, expected: usize) -> Result<Vec<Vec<f32>>, ApiError> {
    if items.len() != expected {
        return Err(ApiError::provider(
            PROVIDER,
            format!("expected {} embeddings, received {}", expected, items.len()),
        ));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for (position, item) in items.into_iter().enumerate() {
        let index = item.index.unwrap_or(position);
        let slot = slots.get_mut(index).ok_or_else(|| {
            ApiError::provider(PROVIDER, format!("embedding index {} out of range", index))
        })?;
        *slot = Some(item.embedding);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| {
                ApiError::provider(PROVIDER, format!("missing embedding for input {}", index))
            })
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn encode(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut embeddings = Vec::with_capacity(inputs.len());
        for slice in inputs.chunks(self.batch_size) {
            embeddings.extend(self.encode_slice(slice, model_id).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: Option<usize>, value: f32) -> EmbeddingItem {
        EmbeddingItem {
            index,
            embedding: vec![value],
        }
    }

    #[test]
    fn reorders_by_reported_index() {
        let ordered = order_embeddings(
            vec![item(Some(2), 2.0), item(Some(0), 0.0), item(Some(1), 1.0)],
            3,
        )
        .unwrap();
        assert_eq!(ordered, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn missing_index_keeps_arrival_order() {
        let ordered = order_embeddings(vec![item(None, 5.0), item(None, 6.0)], 2).unwrap();
        assert_eq!(ordered, vec![vec![5.0], vec![6.0]]);
    }

    #[test]
    fn count_mismatch_is_a_provider_error() {
        let err = order_embeddings(vec![item(None, 1.0)], 2).unwrap_err();
        assert!(matches!(err, ApiError::Provider { .. }));
    }

    #[test]
    fn duplicate_index_is_reported() {
        let err = order_embeddings(vec![item(Some(0), 1.0), item(Some(0), 2.0)], 2).unwrap_err();
        assert!(err.to_string().contains("missing embedding for input 1"));
    }
}
