use moka::sync::Cache;
use raptor_core::errors::{RaptorError, RaptorResult};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Default number of cached per-text counts.
pub const DEFAULT_TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// Accurate token counter wrapping tiktoken's cl100k_base tokenizer.
/// Caches results per blake3 content hash for performance.
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
    cache: Cache<String, usize>,
}

impl TokenCounter {
    /// Create a new TokenCounter with the given cache capacity.
    pub fn new(cache_capacity: u64) -> RaptorResult<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| RaptorError::TokenizerUnavailable {
            reason: e.to_string(),
        })?;
        Ok(Self {
            bpe: Arc::new(bpe),
            cache: Cache::new(cache_capacity),
        })
    }

    /// Counter with [`DEFAULT_TOKEN_CACHE_CAPACITY`].
    pub fn with_default_capacity() -> RaptorResult<Self> {
        Self::new(DEFAULT_TOKEN_CACHE_CAPACITY)
    }

    /// Count tokens in the given text (uncached).
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Count tokens with blake3 content-hash caching.
    /// Repeated calls with the same text return the cached result.
    pub fn count_cached(&self, text: &str) -> usize {
        let hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        self.cache.get_with(hash, || self.count(text))
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}
