use serde::{Deserialize, Serialize};

use super::defaults;

/// Rerank gateway configuration. Fixed for the lifetime of a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Registered model backend name, e.g. "lexical-overlap" or "bge-reranker-base".
    pub model_name: String,
    /// Maximum number of cached (query, passage) scores.
    pub cache_capacity: u64,
    /// Upper bound on model invocations in flight for one gateway.
    pub max_concurrent_batches: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model_name: defaults::DEFAULT_RERANK_MODEL_NAME.to_string(),
            cache_capacity: defaults::DEFAULT_RERANK_CACHE_CAPACITY,
            max_concurrent_batches: defaults::DEFAULT_MAX_CONCURRENT_BATCHES,
        }
    }
}
