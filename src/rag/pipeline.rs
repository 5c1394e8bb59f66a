//! RAG pipeline: embed -> retrieve -> assemble -> (schema prompt -> generate).

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use super::context_builder::{ContextAssembler, ContextBuilderConfig};
use super::retrieval::{RetrievalOptions, RetrievalService};
use super::schema::{self, SchemaSummary};
use super::store::RetrievedDocument;
use crate::core::errors::ApiError;
use crate::embedding::EmbeddingService;
use crate::llm::{FragmentReceiver, GenerateParams, GenerationService};

pub const DEFAULT_MARKS: i64 = 5;

/// Result of `RagPipeline::run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub query: String,
    pub documents: Vec<RetrievedDocument>,
    pub num_results: usize,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelIds {
    pub embedding: String,
    pub llm: String,
}

/// Result of `RagPipeline::generate_answer`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub query: String,
    pub answer: String,
    pub marks: i64,
    pub schema: SchemaSummary,
    pub context: String,
    pub model: ModelIds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<RetrievedDocument>>,
}

/// Everything a schema-guided answer needs. Unset sampling fields come
/// from the resolved schema.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub query: String,
    pub marks: i64,
    pub retrieval: RetrievalOptions,
    pub custom_system_prompt: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub include_sources: bool,
}

impl AnswerRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            marks: DEFAULT_MARKS,
            retrieval: RetrievalOptions::default(),
            custom_system_prompt: None,
            temperature: None,
            max_tokens: None,
            include_sources: true,
        }
    }
}

/// Shared preparation for streamed and non-streamed answers.
#[derive(Debug, Clone)]
pub struct PreparedAnswer {
    pub marks: i64,
    pub schema: SchemaSummary,
    pub documents: Vec<RetrievedDocument>,
    pub context: String,
    pub params: GenerateParams,
}

pub struct RagPipeline {
    embedding: Arc<EmbeddingService>,
    retrieval: RetrievalService,
    llm: GenerationService,
}

impl RagPipeline {
    pub fn new(
        embedding: Arc<EmbeddingService>,
        retrieval: RetrievalService,
        llm: GenerationService,
    ) -> Self {
        tracing::info!("RAG Pipeline initialized");
        Self {
            embedding,
            retrieval,
            llm,
        }
    }

    pub fn embedding(&self) -> &Arc<EmbeddingService> {
        &self.embedding
    }

    pub fn model_ids(&self) -> ModelIds {
        ModelIds {
            embedding: self.embedding.model_name().to_string(),
            llm: self.llm.model().to_string(),
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        options: &RetrievalOptions,
    ) -> Result<Vec<RetrievedDocument>, ApiError> {
        tracing::info!("Processing query: {}...", preview(query));
        let vector = self.embedding.embed_single(query).await?;
        self.retrieval.query(&vector, options).await
    }

    /// One batched embedding call, then one index query per vector in input order.
    pub async fn retrieve_batch(
        &self,
        queries: &[String],
        options: &RetrievalOptions,
    ) -> Result<Vec<Vec<RetrievedDocument>>, ApiError> {
        tracing::info!("Processing batch of {} queries", queries.len());
        let vectors = self.embedding.embed_batch(queries).await?;

        let mut results = Vec::with_capacity(vectors.len());
        for (i, vector) in vectors.iter().enumerate() {
            tracing::info!("Retrieving for query {}/{}", i + 1, queries.len());
            results.push(self.retrieval.query(vector, options).await?);
        }
        Ok(results)
    }

    pub async fn run(
        &self,
        query: &str,
        options: &RetrievalOptions,
        include_context: bool,
        include_scores: bool,
    ) -> Result<RunResult, ApiError> {
        let documents = self.retrieve(query, options).await?;
        let context = include_context.then(|| {
            ContextAssembler::new(ContextBuilderConfig {
                include_scores,
                max_context_length: None,
            })
            .assemble(&documents)
        });

        Ok(RunResult {
            query: query.to_string(),
            num_results: documents.len(),
            documents,
            model: self.embedding.model_name().to_string(),
            context,
        })
    }

    pub async fn prepare_answer(&self, request: &AnswerRequest) -> Result<PreparedAnswer, ApiError> {
        tracing::info!(
            "Generating {}-mark answer for query: {}...",
            request.marks,
            preview(&request.query)
        );

        let marks = schema::validate_marks(request.marks);
        let answer_schema = schema::schema_for(marks);
        let temperature = request.temperature.unwrap_or(answer_schema.temperature);
        let max_tokens = request
            .max_tokens
            .filter(|t| *t > 0)
            .unwrap_or(answer_schema.max_tokens);

        let documents = self.retrieve(&request.query, &request.retrieval).await?;
        let context = ContextAssembler::unbounded().assemble(&documents);

        let (system_prompt, user_prompt) = match request
            .custom_system_prompt
            .as_deref()
            .filter(|p| !p.is_empty())
        {
            Some(custom) => (
                custom.to_string(),
                schema::build_custom_user_prompt(&request.query, &context),
            ),
            None => (
                schema::build_system_prompt(marks),
                schema::build_user_prompt(&request.query, &context, marks),
            ),
        };

        let params = GenerateParams {
            prompt: user_prompt,
            system_prompt: Some(system_prompt),
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
            stop: None,
        };

        Ok(PreparedAnswer {
            marks,
            schema: answer_schema.summary(temperature, max_tokens),
            documents,
            context,
            params,
        })
    }

    pub async fn generate_answer(&self, request: &AnswerRequest) -> Result<AnswerResult, ApiError> {
        let prepared = self.prepare_answer(request).await?;
        let answer = self.llm.generate(prepared.params).await?;

        Ok(AnswerResult {
            query: request.query.clone(),
            answer,
            marks: prepared.marks,
            schema: prepared.schema,
            context: prepared.context,
            model: self.model_ids(),
            sources: request.include_sources.then_some(prepared.documents),
        })
    }

    /// Same preparation as `generate_answer`; fragments arrive on the receiver.
    pub async fn generate_answer_stream(
        &self,
        request: &AnswerRequest,
    ) -> Result<FragmentReceiver, ApiError> {
        let prepared = self.prepare_answer(request).await?;
        self.llm.generate_stream(prepared.params).await
    }

    pub async fn get_stats(&self) -> Result<Value, ApiError> {
        let index = self.retrieval.index_stats().await?;
        Ok(json!({
            "embedding": self.embedding.cache_stats(),
            "index": index,
        }))
    }
}

/// First 100 characters, for log lines.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
