//! Embedding adapter: text -> vector through an external encoder, with an
//! optional process-wide cache for single-query lookups.

mod cache;
mod http;
mod provider;
mod service;

pub use cache::{CacheStats, Embedding, EmbeddingCache};
pub use http::HttpEmbeddingProvider;
pub use provider::EmbeddingProvider;
pub use service::EmbeddingService;
