//! Bounded in-memory embedding cache with least-frequently-used eviction.
//!
//! Keys are SHA-256 digests of `"{model}:{query}"`. Each entry carries an
//! access counter; inserting a new key into a full cache evicts the entry
//! with the lowest counter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Shared, read-only embedding vector.
pub type Embedding = Arc<[f32]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub total_accesses: u64,
}

struct CacheEntry {
    embedding: Embedding,
    accesses: u64,
}

pub struct EmbeddingCache {
    max_size: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl EmbeddingCache {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        tracing::info!("Initialized embedding cache with max_size={}", max_size);
        Self {
            max_size,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, query: &str, model_name: &str) -> Option<Embedding> {
        let key = cache_key(query, model_name);
        let mut entries = self.lock();

        match entries.get_mut(&key) {
            Some(entry) => {
                entry.accesses += 1;
                tracing::debug!("Cache HIT for query: {}", preview(query));
                Some(entry.embedding.clone())
            }
            None => {
                tracing::debug!("Cache MISS for query: {}", preview(query));
                None
            }
        }
    }

    pub fn set(&self, query: &str, model_name: &str, embedding: Embedding) {
        let key = cache_key(query, model_name);
        let mut entries = self.lock();

        if !entries.contains_key(&key) && entries.len() >= self.max_size {
            evict_least_used(&mut entries);
        }

        entries.insert(
            key,
            CacheEntry {
                embedding,
                accesses: 1,
            },
        );
        tracing::debug!("Cache SET for query: {}", preview(query));
    }

    pub fn clear(&self) {
        self.lock().clear();
        tracing::info!("Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            size: entries.len(),
            max_size: self.max_size,
            total_accesses: entries.values().map(|entry| entry.accesses).sum(),
        }
    }

    // Every mutation is a single map operation, so a poisoned lock still
    // guards a consistent map.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn evict_least_used(entries: &mut HashMap<String, CacheEntry>) {
    let least_used = entries
        .iter()
        .min_by_key(|(_, entry)| entry.accesses)
        .map(|(key, _)| key.clone());

    if let Some(key) = least_used {
        entries.remove(&key);
        tracing::debug!("Evicted least used cache entry");
    }
}

fn cache_key(query: &str, model_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model_name.as_bytes());
    hasher.update(b":");
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())
}

fn preview(query: &str) -> String {
    let head: String = query.chars().take(50).collect();
    format!("{}...", head)
}
