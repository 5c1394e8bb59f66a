use std::sync::Arc;

use serde_json::{json, Value};

use super::cache::{Embedding, EmbeddingCache};
use super::provider::EmbeddingProvider;
use crate::core::config::EmbeddingSettings;
use crate::core::errors::ApiError;

/// Embedding adapter. Owns the optional query cache.
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingProvider>,
    model_name: String,
    normalize: bool,
    cache: Option<EmbeddingCache>,
}

impl EmbeddingService {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        model_name: impl Into<String>,
        normalize: bool,
        cache: Option<EmbeddingCache>,
    ) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
            normalize,
            cache,
        }
    }

    pub fn from_settings(provider: Arc<dyn EmbeddingProvider>, settings: &EmbeddingSettings) -> Self {
        tracing::info!("Loading embedding model: {}", settings.model_name);
        tracing::info!("Device: {}", settings.device);

        let cache = settings
            .enable_cache
            .then(|| EmbeddingCache::new(settings.cache_max_size));

        Self::new(
            provider,
            settings.model_name.clone(),
            settings.normalize,
            cache,
        )
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Cache-first single-text embedding.
    pub async fn embed_single(&self, text: &str) -> Result<Embedding, ApiError> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text, &self.model_name) {
                return Ok(cached);
            }
        }

        let embedding = self.embed_uncached(text).await?;

        if let Some(cache) = &self.cache {
            cache.set(text, &self.model_name, embedding.clone());
        }

        Ok(embedding)
    }

    /// Encodes without touching the cache.
    pub async fn embed_uncached(&self, text: &str) -> Result<Embedding, ApiError> {
        let mut vectors = self.encode(&[text.to_string()]).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| ApiError::provider("embedding", "no embedding returned"))?;
        Ok(Arc::from(vector))
    }

    /// One batched encode call; the cache is neither read nor written.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        tracing::info!("Batch encoding {} queries", texts.len());
        self.encode(texts).await
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
            tracing::info!("Embedding cache cleared");
        }
    }

    pub fn cache_stats(&self) -> Value {
        match &self.cache {
            Some(cache) => json!(cache.stats()),
            None => json!({ "cache_enabled": false }),
        }
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let mut vectors = self.provider.encode(texts, &self.model_name).await?;
        if self.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize(v));
        }
        Ok(vectors)
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return;
    }
    vector.iter_mut().for_each(|x| *x /= norm);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    /// Maps each text to `[len, 0]` and counts provider calls.
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn encode(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }
    }

    fn service(normalize: bool, cached: bool) -> (EmbeddingService, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let cache = cached.then(|| EmbeddingCache::new(10));
        let svc = EmbeddingService::new(provider.clone(), "mpnet", normalize, cache);
        (svc, provider)
    }

    #[tokio::test]
    async fn repeated_single_embeds_hit_the_cache() {
        let (svc, provider) = service(false, true);
        let first = svc.embed_single("abc").await.unwrap();
        let second = svc.embed_single("abc").await.unwrap();

        assert_eq!(&*first, &[3.0, 0.0]);
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(svc.cache_stats()["total_accesses"], 2);
    }

    #[tokio::test]
    async fn batch_bypasses_the_cache() {
        let (svc, provider) = service(false, true);
        svc.embed_single("abc").await.unwrap();

        let batch = svc
            .embed_batch(&["abc".to_string(), "de".to_string()])
            .await
            .unwrap();

        assert_eq!(batch, vec![vec![3.0, 0.0], vec![2.0, 0.0]]);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(svc.cache_stats()["size"], 1);
    }

    #[tokio::test]
    async fn uncached_embed_leaves_cache_untouched() {
        let (svc, provider) = service(false, true);
        svc.embed_uncached("abc").await.unwrap();
        svc.embed_uncached("abc").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(svc.cache_stats()["size"], 0);
    }

    #[tokio::test]
    async fn normalization_produces_unit_vectors() {
        let (svc, _) = service(true, false);
        let v = svc.embed_single("abcd").await.unwrap();
        assert_eq!(&*v, &[1.0, 0.0]);
    }

    #[tokio::test]
    async fn disabled_cache_reports_itself() {
        let (svc, provider) = service(false, false);
        svc.embed_single("abc").await.unwrap();
        svc.embed_single("abc").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(svc.cache_stats(), json!({ "cache_enabled": false }));
    }

    #[tokio::test]
    async fn clear_cache_forces_re_encode() {
        let (svc, provider) = service(false, true);
        svc.embed_single("abc").await.unwrap();
        svc.clear_cache();
        svc.embed_single("abc").await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_vector_is_left_alone() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
