//! Pinecone data-plane client over REST.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::store::{IndexQuery, IndexStats, NamespaceStats, RetrievedDocument, VectorIndex};
use crate::core::config::PineconeSettings;
use crate::core::errors::ApiError;

const PROVIDER: &str = "pinecone";
const API_VERSION: &str = "2024-07";

#[derive(Clone)]
pub struct PineconeIndex {
    host: String,
    api_key: String,
    client: Client,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeStatsResponse {
    #[serde(default)]
    dimension: Option<u64>,
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceSummary {
    #[serde(default)]
    vector_count: u64,
}

impl PineconeIndex {
    pub fn new(host: String, api_key: String) -> Self {
        Self {
            host: normalize_host(&host),
            api_key,
            client: Client::new(),
        }
    }

    /// Uses the configured host, or asks the control plane for the index host.
    pub async fn connect(settings: &PineconeSettings) -> Result<Self, ApiError> {
        tracing::info!("Initializing Pinecone client");

        let host = match settings.index_host.as_deref().filter(|h| !h.is_empty()) {
            Some(host) => host.to_string(),
            None => resolve_index_host(settings).await?,
        };

        tracing::info!("Connected to Pinecone index: {}", settings.index_name);
        Ok(Self::new(host, settings.api_key.clone()))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.host, path);
        let res = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::provider(PROVIDER, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::provider(
                PROVIDER,
                format!("{} failed ({}): {}", path, status, text),
            ));
        }
        Ok(res)
    }
}

async fn resolve_index_host(settings: &PineconeSettings) -> Result<String, ApiError> {
    if settings.index_name.is_empty() {
        return Err(ApiError::BadRequest(
            "pinecone.index_name (PINECONE_INDEX_NAME) is required".to_string(),
        ));
    }

    let url = format!(
        "{}/indexes/{}",
        settings.control_plane_url.trim_end_matches('/'),
        settings.index_name
    );
    let res = Client::new()
        .get(&url)
        .header("Api-Key", &settings.api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .map_err(|e| ApiError::provider(PROVIDER, e))?;

    if !res.status().is_success() {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        return Err(ApiError::provider(
            PROVIDER,
            format!("describe index '{}' failed ({}): {}", settings.index_name, status, text),
        ));
    }

    let described: DescribeIndexResponse = res
        .json()
        .await
        .map_err(|e| ApiError::provider(PROVIDER, e))?;
    Ok(described.host)
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn query_body(query: &IndexQuery) -> Value {
    let mut body = json!({
        "vector": query.vector,
        "topK": query.top_k,
        "includeMetadata": true,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(ns) = query.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            obj.insert("namespace".to_string(), json!(ns));
        }
        if let Some(filter) = query.filter.as_ref().filter(|f| !f.is_empty()) {
            obj.insert("filter".to_string(), Value::Object(filter.clone()));
        }
    }
    body
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, query: IndexQuery) -> Result<Vec<RetrievedDocument>, ApiError> {
        let res = self.post("/query", &query_body(&query)).await?;
        let payload: QueryResponse = res
            .json()
            .await
            .map_err(|e| ApiError::provider(PROVIDER, e))?;

        Ok(payload
            .matches
            .into_iter()
            .map(|m| RetrievedDocument {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats, ApiError> {
        let res = self.post("/describe_index_stats", &json!({})).await?;
        let payload: DescribeStatsResponse = res
            .json()
            .await
            .map_err(|e| ApiError::provider(PROVIDER, e))?;

        Ok(IndexStats {
            dimension: payload.dimension,
            total_vector_count: payload.total_vector_count,
            namespaces: payload
                .namespaces
                .into_iter()
                .map(|(name, summary)| {
                    (
                        name,
                        NamespaceStats {
                            vector_count: summary.vector_count,
                        },
                    )
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_gets_https_scheme() {
        assert_eq!(
            normalize_host("notes-abc.svc.pinecone.io/"),
            "https://notes-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080"), "http://localhost:5080");
    }

    #[test]
    fn query_body_omits_empty_namespace_and_filter() {
        let body = query_body(&IndexQuery {
            vector: vec![0.5, 0.5],
            top_k: 3,
            namespace: Some(String::new()),
            filter: Some(Map::new()),
        });
        assert_eq!(
            body,
            json!({ "vector": [0.5, 0.5], "topK": 3, "includeMetadata": true })
        );
    }

    #[test]
    fn query_body_carries_namespace_and_filter() {
        let mut filter = Map::new();
        filter.insert("subject".to_string(), json!({ "$eq": "physics" }));
        let body = query_body(&IndexQuery {
            vector: vec![1.0],
            top_k: 5,
            namespace: Some("sem1".to_string()),
            filter: Some(filter),
        });
        assert_eq!(body["namespace"], "sem1");
        assert_eq!(body["filter"]["subject"]["$eq"], "physics");
    }

    #[test]
    fn stats_payload_parses_camel_case() {
        let payload: DescribeStatsResponse = serde_json::from_value(json!({
            "dimension": 768,
            "indexFullness": 0.0,
            "totalVectorCount": 12,
            "namespaces": { "": { "vectorCount": 2 }, "sem1": { "vectorCount": 10 } }
        }))
        .unwrap();
        assert_eq!(payload.dimension, Some(768));
        assert_eq!(payload.total_vector_count, 12);
        assert_eq!(payload.namespaces["sem1"].vector_count, 10);
    }

    #[test]
    fn match_without_metadata_parses() {
        let payload: QueryResponse = serde_json::from_value(json!({
            "matches": [{ "id": "a", "score": 0.9 }],
            "namespace": ""
        }))
        .unwrap();
        assert_eq!(payload.matches.len(), 1);
        assert!(payload.matches[0].metadata.is_none());
    }
}
