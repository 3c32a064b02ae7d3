use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use raptor_core::cancellation::CancellationToken;
use raptor_core::config::{RerankConfig, RetrievalConfig};
use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::traits::IRerankModel;
use raptor_observability::events;

use crate::cache::{CacheStats, RerankCache, RerankKey};
use crate::models::build_model;
use crate::passage::Passage;

/// Uniform scoring front for one rerank model.
///
/// Owns the score cache and the worker pool. Cheap to share behind an `Arc`
/// across concurrent queries; per-call settings come from the
/// [`RetrievalConfig`] snapshot passed to each call.
pub struct RerankGateway {
    model: Arc<dyn IRerankModel>,
    model_name: Arc<str>,
    cache: RerankCache,
    workers: Arc<Semaphore>,
}

/// Scores computed by one dispatch, as (input index, score).
type Computed = Vec<(usize, f64)>;

impl RerankGateway {
    pub fn new(model: Arc<dyn IRerankModel>, config: &RerankConfig) -> RaptorResult<Self> {
        if config.max_concurrent_batches < 1 {
            return Err(RaptorError::InvalidConfig {
                reason: "max_concurrent_batches must be >= 1".into(),
            });
        }
        if config.cache_capacity < 1 {
            return Err(RaptorError::InvalidConfig {
                reason: "cache_capacity must be >= 1".into(),
            });
        }
        let model_name: Arc<str> = Arc::from(model.name());
        Ok(Self {
            model,
            model_name,
            cache: RerankCache::new(config.cache_capacity),
            workers: Arc::new(Semaphore::new(config.max_concurrent_batches)),
        })
    }

    /// Gateway over the backend registered as `config.model_name`.
    pub fn from_config(config: &RerankConfig) -> RaptorResult<Self> {
        Self::new(build_model(&config.model_name)?, config)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn cache(&self) -> &RerankCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Whether recall scores are bunched closely enough for a rerank pass
    /// to be worth its latency. Always false for an empty list or one
    /// holding a non-finite score.
    pub fn should_rerank(scores: &[f64], spread_threshold: f64) -> bool {
        if scores.is_empty() || scores.iter().any(|s| !s.is_finite()) {
            return false;
        }
        let (min, max) = scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });
        max - min < spread_threshold
    }

    /// Score one passage.
    pub async fn score(
        &self,
        query: &str,
        passage: &Passage,
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RaptorResult<f64> {
        let scores = self
            .batch_score(query, std::slice::from_ref(passage), config, cancel)
            .await?;
        scores
            .first()
            .copied()
            .ok_or_else(|| self.unavailable("no score returned for a single passage"))
    }

    /// Score every passage, in input order.
    ///
    /// Cached scores are reused; misses go to the model in chunks of
    /// `rerank_batch_size`, at most `max_concurrent_batches` at a time.
    /// `rerank_timeout_ms` bounds the whole call. Any model fault, timeout,
    /// or malformed reply is `RerankUnavailable` and leaves the cache as it
    /// was. So is a miss against a model whose `is_available` is false.
    /// Cancellation stops new chunks from being issued and surfaces as
    /// `Cancelled`.
    pub async fn batch_score(
        &self,
        query: &str,
        passages: &[Passage],
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RaptorResult<Vec<f64>> {
        if config.rerank_batch_size < 1 {
            return Err(RaptorError::InvalidConfig {
                reason: "rerank_batch_size must be >= 1".into(),
            });
        }
        if passages.is_empty() {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(cancelled());
        }

        let started = Instant::now();
        let query: Arc<str> = Arc::from(query);
        let keys: Vec<RerankKey> = passages
            .iter()
            .map(|p| RerankKey {
                model: Arc::clone(&self.model_name),
                query: Arc::clone(&query),
                passage: p.key.clone(),
            })
            .collect();

        let mut scores: Vec<Option<f64>> = Vec::with_capacity(passages.len());
        let mut misses = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            let cached = self.cache.get(key)?;
            if cached.is_none() {
                misses.push(i);
            }
            scores.push(cached);
        }
        let cache_hits = passages.len() - misses.len();
        let batches = misses.len().div_ceil(config.rerank_batch_size);

        if !misses.is_empty() {
            if !self.model.is_available() {
                return Err(self.unavailable("model reports itself unavailable"));
            }
            let timeout = config.rerank_timeout();
            let dispatch = self.dispatch(&query, passages, &misses, config.rerank_batch_size, cancel);
            let computed = match tokio::time::timeout(timeout, dispatch).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(self.unavailable(format!(
                        "timed out after {}ms",
                        config.rerank_timeout_ms
                    )))
                }
            };
            // Every chunk succeeded; only now do scores become visible to others.
            for (i, score) in computed {
                self.cache.insert(keys[i].clone(), score);
                scores[i] = Some(score);
            }
        }

        let scores = scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| RaptorError::CacheCorruption {
                    details: format!("passage {i} has no score after a successful batch"),
                })
            })
            .collect::<RaptorResult<Vec<f64>>>()?;

        debug!(
            model = %self.model_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch scored"
        );
        events::rerank_completed(&self.model_name, passages.len(), cache_hits, batches);
        Ok(scores)
    }

    /// Issue one blocking task per chunk of `misses` and gather all results.
    ///
    /// Returning early (error, cancellation, or the caller's timeout dropping
    /// this future) drops the `JoinSet`, which aborts chunks not yet started.
    async fn dispatch(
        &self,
        query: &Arc<str>,
        passages: &[Passage],
        misses: &[usize],
        batch_size: usize,
        cancel: &CancellationToken,
    ) -> RaptorResult<Computed> {
        let mut tasks = JoinSet::new();
        for chunk in misses.chunks(batch_size) {
            let permit = Arc::clone(&self.workers)
                .acquire_owned()
                .await
                .map_err(|_| self.unavailable("worker pool closed"))?;
            if cancel.is_cancelled() {
                return Err(cancelled());
            }
            let indices = chunk.to_vec();
            let texts: Vec<String> = chunk.iter().map(|&i| passages[i].text.clone()).collect();
            let model = Arc::clone(&self.model);
            let query = Arc::clone(query);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = model.score_batch(&query, &texts);
                (indices, result)
            });
        }

        let mut computed = Vec::with_capacity(misses.len());
        while let Some(joined) = tasks.join_next().await {
            let (indices, result) =
                joined.map_err(|e| self.unavailable(format!("batch task failed: {e}")))?;
            let batch = result.map_err(|e| self.unavailable(format!("model fault: {e}")))?;
            if batch.len() != indices.len() {
                return Err(self.unavailable(format!(
                    "model returned {} scores for {} passages",
                    batch.len(),
                    indices.len()
                )));
            }
            for (i, score) in indices.into_iter().zip(batch) {
                if !score.is_finite() {
                    return Err(self.unavailable(format!("non-finite score {score}")));
                }
                computed.push((i, score));
            }
        }
        Ok(computed)
    }

    fn unavailable(&self, reason: impl Into<String>) -> RaptorError {
        RaptorError::RerankUnavailable {
            model: self.model_name.to_string(),
            reason: reason.into(),
        }
    }
}

fn cancelled() -> RaptorError {
    RaptorError::Cancelled {
        stage: "rerank".into(),
    }
}

impl std::fmt::Debug for RerankGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankGateway")
            .field("model", &self.model_name)
            .field("available_workers", &self.workers.available_permits())
            .finish()
    }
}
