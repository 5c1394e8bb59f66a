use std::sync::Arc;

use crate::core::config::Settings;
use crate::embedding::{EmbeddingService, HttpEmbeddingProvider};
use crate::llm::{GenerationService, GroqProvider};
use crate::rag::{PineconeIndex, RagPipeline, RetrievalService};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Built once at startup and handed to the router as `Arc<AppState>`:
/// - Effective settings
/// - The embedding service (and its cache), also reachable through the pipeline
/// - The RAG pipeline wrapping the index and LLM adapters
pub struct AppState {
    pub settings: Settings,
    pub embedding: Arc<EmbeddingService>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// This process includes:
    /// 1. Building the embedding client and its cache
    /// 2. Connecting to the Pinecone index (resolving its host if needed)
    /// 3. Building the Groq client
    /// 4. Wiring the pipeline
    pub async fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let provider = HttpEmbeddingProvider::new(
            settings.embedding.api_base.clone(),
            settings.embedding.api_key.clone(),
            settings.embedding.batch_size,
        );
        let embedding = Arc::new(EmbeddingService::from_settings(
            Arc::new(provider),
            &settings.embedding,
        ));

        let index = PineconeIndex::connect(&settings.pinecone)
            .await
            .map_err(|e| InitializationError::Retrieval(e.into()))?;
        let retrieval =
            RetrievalService::from_settings(Arc::new(index), &settings.retrieval, &settings.pinecone);

        if settings.generation.api_key.is_empty() {
            return Err(InitializationError::Llm(anyhow::anyhow!(
                "generation.api_key (GROQ_API_KEY) is required"
            )));
        }
        let groq = GroqProvider::new(
            settings.generation.api_base.clone(),
            settings.generation.api_key.clone(),
        );
        let llm = GenerationService::from_settings(Arc::new(groq), &settings.generation);

        let pipeline = Arc::new(RagPipeline::new(embedding.clone(), retrieval, llm));
        Ok(Self::from_parts(settings, pipeline))
    }

    /// Assembles state around an existing pipeline.
    pub fn from_parts(settings: Settings, pipeline: Arc<RagPipeline>) -> Arc<Self> {
        Arc::new(Self {
            settings,
            embedding: pipeline.embedding().clone(),
            pipeline,
        })
    }
}
