//! Rerank score cache using moka with a least-recently-used eviction policy.
//!
//! The only state shared across concurrent queries. moka gives per-entry
//! atomic insert and replace, so concurrent writers for one key resolve
//! last-writer-wins and an evicted entry is never returned.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_observability::events;

use crate::passage::PassageKey;

/// Cache key: exact model, exact query, passage identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RerankKey {
    pub model: Arc<str>,
    pub query: Arc<str>,
    pub passage: PassageKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

pub struct RerankCache {
    cache: Cache<RerankKey, f64>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RerankCache {
    pub fn new(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a score. A stored non-finite score can only come from a bug;
    /// it is evicted and reported as `CacheCorruption`.
    pub fn get(&self, key: &RerankKey) -> RaptorResult<Option<f64>> {
        match self.cache.get(key) {
            Some(score) if score.is_finite() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(score))
            }
            Some(score) => {
                self.cache.invalidate(key);
                let details = format!(
                    "non-finite score {score} cached for model {} passage {:?}",
                    key.model, key.passage
                );
                events::cache_corruption_detected(&details);
                Err(RaptorError::CacheCorruption { details })
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    pub fn insert(&self, key: RerankKey, score: f64) {
        self.cache.insert(key, score);
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        }
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
