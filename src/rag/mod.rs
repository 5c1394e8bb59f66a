//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `RagPipeline`: embed, retrieve, assemble context and generate schema-guided answers
//! - `ContextAssembler`: joins ranked documents into a bounded context string
//! - `schema`: mark value -> answer schema and prompt templates
//! - `PineconeIndex`: the production `VectorIndex`

mod context_builder;
mod pinecone;
mod pipeline;
mod retrieval;
pub mod schema;
mod store;


pub use context_builder::{ContextAssembler, ContextBuilderConfig, CONTEXT_SEPARATOR};
pub use pinecone::PineconeIndex;
pub use pipeline::{
    AnswerRequest, AnswerResult, ModelIds, PreparedAnswer, RagPipeline, RunResult, DEFAULT_MARKS,
};
pub use retrieval::{RetrievalOptions, RetrievalService};
pub use schema::{AnswerSchema, SchemaSummary};
pub use store::{IndexQuery, IndexStats, NamespaceStats, RetrievedDocument, VectorIndex};
