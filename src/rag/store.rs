//! VectorIndex trait: abstract interface over the external similarity index.
//!
//! The pipeline never searches on its own; ranking, filtering and namespace
//! scoping are all delegated to the implementation (Pinecone in production).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::ApiError;

/// A ranked match returned by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    /// Similarity score (higher = more relevant).
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RetrievedDocument {
    /// The chunk text stored under `metadata.text`, if any.
    pub fn text(&self) -> Option<&str> {
        self.metadata.get("text").and_then(|v| v.as_str())
    }
}

/// One similarity search, fully resolved (top-k already capped).
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub namespace: Option<String>,
    pub filter: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceStats {
    pub vector_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub dimension: Option<u64>,
    pub total_vector_count: u64,
    pub namespaces: BTreeMap<String, NamespaceStats>,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Matches in provider ranking order (descending score).
    async fn query(&self, query: IndexQuery) -> Result<Vec<RetrievedDocument>, ApiError>;

    async fn describe_stats(&self) -> Result<IndexStats, ApiError>;
}
