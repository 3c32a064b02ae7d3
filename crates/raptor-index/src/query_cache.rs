//! Query embedding cache using moka.
//!
//! Keys are blake3 hashes of the exact query string. Paraphrases miss.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

/// Cached query embeddings, shared by every query against one index.
pub struct QueryCache {
    cache: Cache<String, Arc<Vec<f32>>>,
}

impl QueryCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_idle(Duration::from_secs(3600))
            .build();
        Self { cache }
    }

    pub fn key(query: &str) -> String {
        blake3::hash(query.as_bytes()).to_hex().to_string()
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<f32>>> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: String, embedding: Arc<Vec<f32>>) {
        self.cache.insert(key, embedding);
    }

    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
