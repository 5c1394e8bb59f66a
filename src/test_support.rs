//! Deterministic stand-ins for the external providers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::mpsc;

use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::core::errors::ApiError;
use crate::embedding::{EmbeddingCache, EmbeddingProvider, EmbeddingService};
use crate::llm::{ChatRequest, FragmentReceiver, GenerationService, LlmProvider};
use crate::rag::{
    IndexQuery, IndexStats, NamespaceStats, RagPipeline, RetrievalService, RetrievedDocument,
    VectorIndex,
};

/// Maps each text to `[chars, words]` and counts encode calls.
#[derive(Default)]
pub struct StubEmbedder {
    pub calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn name(&self) -> &str {
        "stub"
    }

    async fn encode(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs
            .iter()
            .map(|t| vec![t.chars().count() as f32, t.split_whitespace().count() as f32])
            .collect())
    }
}

/// Returns the same ranked documents for every query and records queries.
pub struct StubIndex {
    documents: Vec<RetrievedDocument>,
    fail: bool,
    pub seen: Mutex<Vec<IndexQuery>>,
}

impl StubIndex {
    pub fn new(documents: Vec<RetrievedDocument>) -> Self {
        Self {
            documents,
            fail: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn queries(&self) -> Vec<IndexQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for StubIndex {
    async fn query(&self, query: IndexQuery) -> Result<Vec<RetrievedDocument>, ApiError> {
        if self.fail {
            return Err(ApiError::provider("pinecone", "index unavailable: 503"));
        }
        let top_k = query.top_k;
        self.seen.lock().unwrap().push(query);
        Ok(self.documents.iter().take(top_k).cloned().collect())
    }

    async fn describe_stats(&self) -> Result<IndexStats, ApiError> {
        let mut stats = IndexStats {
            dimension: Some(2),
            total_vector_count: self.documents.len() as u64,
            ..Default::default()
        };
        stats.namespaces.insert(
            String::new(),
            NamespaceStats {
                vector_count: self.documents.len() as u64,
            },
        );
        Ok(stats)
    }
}

/// Answers with the user prompt it was given; streams it in 7-char pieces.
#[derive(Default)]
pub struct EchoLlm {
    pub last: Mutex<Option<ChatRequest>>,
}

impl EchoLlm {
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last.lock().unwrap().clone()
    }

    fn reply(&self, request: ChatRequest) -> String {
        let reply = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        *self.last.lock().unwrap() = Some(request);
        reply
    }
}

#[async_trait]
impl LlmProvider for EchoLlm {
    fn name(&self) -> &str {
        "echo"
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        Ok(self.reply(request))
    }

    async fn stream_chat(
        &self,
        request: ChatRequest,
        _model_id: &str,
    ) -> Result<FragmentReceiver, ApiError> {
        let chars: Vec<char> = self.reply(request).chars().collect();
        let pieces: Vec<String> = chars.chunks(7).map(|c| c.iter().collect()).collect();
        let (tx, rx) = mpsc::channel(2);
        tokio::spawn(async move {
            for piece in pieces {
                if tx.send(Ok(piece)).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

pub fn document(id: &str, score: f32, text: &str) -> RetrievedDocument {
    let mut metadata = Map::new();
    metadata.insert("text".to_string(), Value::from(text));
    metadata.insert("source".to_string(), json!(format!("{}.pdf", id)));
    RetrievedDocument {
        id: id.to_string(),
        score,
        metadata,
    }
}

pub fn sample_documents() -> Vec<RetrievedDocument> {
    vec![
        document("os-1", 0.92, "A process is a program in execution."),
        document("os-2", 0.81, "Threads share the address space of their process."),
    ]
}

/// Built-in defaults only; no file or environment layers.
pub fn test_settings() -> Settings {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = ConfigService::new(Arc::new(AppPaths::with_root(dir.path().to_path_buf())));
    let config = service
        .load_config_with(&Value::Object(Map::new()))
        .expect("defaults load");
    Settings::from_value(config).expect("defaults deserialize")
}

pub struct Harness {
    pub embedder: Arc<StubEmbedder>,
    pub index: Arc<StubIndex>,
    pub llm: Arc<EchoLlm>,
    pub embedding: Arc<EmbeddingService>,
    pub pipeline: Arc<RagPipeline>,
}

pub fn harness_with(index: StubIndex) -> Harness {
    let embedder = Arc::new(StubEmbedder::default());
    let index = Arc::new(index);
    let llm = Arc::new(EchoLlm::default());

    let embedding = Arc::new(EmbeddingService::new(
        embedder.clone(),
        "stub-mpnet",
        false,
        Some(EmbeddingCache::new(100)),
    ));
    let retrieval = RetrievalService::new(index.clone(), 5, 20, None);
    let generation = GenerationService::new(llm.clone(), "echo-70b", 0.7, 1024);
    let pipeline = Arc::new(RagPipeline::new(embedding.clone(), retrieval, generation));

    Harness {
        embedder,
        index,
        llm,
        embedding,
        pipeline,
    }
}

pub fn harness() -> Harness {
    harness_with(StubIndex::new(sample_documents()))
}
