use std::sync::Arc;

use serde_json::{Map, Value};

use super::store::{IndexQuery, IndexStats, RetrievedDocument, VectorIndex};
use crate::core::config::{PineconeSettings, RetrievalSettings};
use crate::core::errors::ApiError;

/// Per-request retrieval knobs. Unset fields fall back to configuration.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOptions {
    pub top_k: Option<usize>,
    pub namespace: Option<String>,
    pub filter: Option<Map<String, Value>>,
}

/// Retrieval adapter: resolves top-k and namespace, then queries the index.
pub struct RetrievalService {
    index: Arc<dyn VectorIndex>,
    default_top_k: usize,
    max_top_k: usize,
    default_namespace: Option<String>,
}

impl RetrievalService {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        default_top_k: usize,
        max_top_k: usize,
        default_namespace: Option<String>,
    ) -> Self {
        Self {
            index,
            default_top_k,
            max_top_k,
            default_namespace,
        }
    }

    pub fn from_settings(
        index: Arc<dyn VectorIndex>,
        retrieval: &RetrievalSettings,
        pinecone: &PineconeSettings,
    ) -> Self {
        Self::new(
            index,
            retrieval.default_top_k,
            retrieval.max_top_k,
            pinecone.namespace.clone().filter(|ns| !ns.is_empty()),
        )
    }

    /// Zero counts as unset; values above the maximum are capped, not rejected.
    pub fn resolve_top_k(&self, requested: Option<usize>) -> usize {
        let top_k = requested
            .filter(|k| *k > 0)
            .unwrap_or(self.default_top_k);
        if top_k > self.max_top_k {
            tracing::warn!(
                "top_k={} exceeds MAX_TOP_K={}, capping",
                top_k,
                self.max_top_k
            );
            return self.max_top_k;
        }
        top_k
    }

    pub async fn query(
        &self,
        vector: &[f32],
        options: &RetrievalOptions,
    ) -> Result<Vec<RetrievedDocument>, ApiError> {
        let top_k = self.resolve_top_k(options.top_k);
        let namespace = options
            .namespace
            .clone()
            .or_else(|| self.default_namespace.clone());

        tracing::info!(
            "Querying index: top_k={}, namespace={}",
            top_k,
            namespace.as_deref().unwrap_or("<default>")
        );

        let documents = self
            .index
            .query(IndexQuery {
                vector: vector.to_vec(),
                top_k,
                namespace,
                filter: options.filter.clone(),
            })
            .await?;

        tracing::info!("Retrieved {} documents", documents.len());
        Ok(documents)
    }

    pub async fn index_stats(&self) -> Result<IndexStats, ApiError> {
        self.index.describe_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    struct CapturingIndex {
        seen: Mutex<Vec<IndexQuery>>,
    }

    #[async_trait]
    impl VectorIndex for CapturingIndex {
        async fn query(&self, query: IndexQuery) -> Result<Vec<RetrievedDocument>, ApiError> {
            let top_k = query.top_k;
            self.seen.lock().unwrap().push(query);
            Ok((0..top_k)
                .map(|i| RetrievedDocument {
                    id: format!("doc-{}", i),
                    score: 1.0 - i as f32 * 0.1,
                    metadata: Map::new(),
                })
                .collect())
        }

        async fn describe_stats(&self) -> Result<IndexStats, ApiError> {
            Ok(IndexStats::default())
        }
    }

    fn service(default_namespace: Option<&str>) -> (RetrievalService, Arc<CapturingIndex>) {
        let index = Arc::new(CapturingIndex {
            seen: Mutex::new(Vec::new()),
        });
        let svc = RetrievalService::new(index.clone(), 5, 20, default_namespace.map(String::from));
        (svc, index)
    }

    #[test]
    fn top_k_resolution() {
        let (svc, _) = service(None);
        assert_eq!(svc.resolve_top_k(None), 5);
        assert_eq!(svc.resolve_top_k(Some(0)), 5);
        assert_eq!(svc.resolve_top_k(Some(12)), 12);
        assert_eq!(svc.resolve_top_k(Some(20)), 20);
        assert_eq!(svc.resolve_top_k(Some(50)), 20);
    }

    #[tokio::test]
    async fn query_preserves_index_order_and_forwards_options() {
        let (svc, index) = service(None);
        let mut filter = Map::new();
        filter.insert("unit".to_string(), Value::from(3));

        let docs = svc
            .query(
                &[0.1, 0.2],
                &RetrievalOptions {
                    top_k: Some(3),
                    namespace: Some("sem1".to_string()),
                    filter: Some(filter.clone()),
                },
            )
            .await
            .unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2"]);

        let seen = index.seen.lock().unwrap();
        assert_eq!(seen[0].vector, vec![0.1, 0.2]);
        assert_eq!(seen[0].namespace.as_deref(), Some("sem1"));
        assert_eq!(seen[0].filter.as_ref(), Some(&filter));
    }

    #[tokio::test]
    async fn configured_namespace_applies_when_request_has_none() {
        let (svc, index) = service(Some("default-ns"));
        svc.query(&[1.0], &RetrievalOptions::default()).await.unwrap();
        assert_eq!(
            index.seen.lock().unwrap()[0].namespace.as_deref(),
            Some("default-ns")
        );
    }
}
