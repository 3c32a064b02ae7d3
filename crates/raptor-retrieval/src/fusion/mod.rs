//! Fusion Controller: recall, decide, rerank, merge, degrade.

mod state;

use std::sync::Arc;
use std::time::Instant;

use raptor_core::cancellation::CancellationToken;
use raptor_core::config::{RaptorConfig, RetrievalConfig};
use raptor_core::constants::{COMPONENT_RERANK, FALLBACK_RECALL_ORDER};
use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::models::{
    CandidateNode, DegradationEvent, RerankDecision, RerankedCandidate, RetrievalOutcome,
    RetrievedPassages,
};
use raptor_core::traits::ITreeIndex;
use raptor_observability::{events, rerank_span, retrieval_span};
use raptor_rerank::{Passage, RerankGateway};
use raptor_tokens::{TokenBudget, TokenCounter};
use tracing::{info, Instrument};

use crate::ranking::sort_by_rerank;
use crate::recall::TreeRecallEngine;

pub use state::QueryState;
use state::StateMachine;

const DEFAULT_TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// Orchestrates one query end to end.
///
/// Holds no per-query state. The rerank gateway's score cache is the only
/// thing concurrent `retrieve` calls share.
pub struct FusionController {
    recall: Arc<TreeRecallEngine>,
    gateway: Option<Arc<RerankGateway>>,
}

impl FusionController {
    pub fn new(recall: TreeRecallEngine) -> Self {
        Self {
            recall: Arc::new(recall),
            gateway: None,
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<RerankGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Wire a controller for `index` from a full config: token counter, and a
    /// gateway over the configured rerank backend.
    pub fn from_config(index: Arc<dyn ITreeIndex>, config: &RaptorConfig) -> RaptorResult<Self> {
        config.retrieval.validate()?;
        let counter = Arc::new(TokenCounter::new(DEFAULT_TOKEN_CACHE_CAPACITY)?);
        let gateway = Arc::new(RerankGateway::from_config(&config.rerank)?);
        Ok(Self::new(TreeRecallEngine::new(index, counter)).with_gateway(gateway))
    }

    pub fn gateway(&self) -> Option<&Arc<RerankGateway>> {
        self.gateway.as_ref()
    }

    /// At most `top_k` passages within `max_tokens`, reranked when that is
    /// enabled and worthwhile.
    ///
    /// Recall failures propagate. A `RerankUnavailable` from the gateway
    /// degrades to the recall order and is reported in the outcome, never as
    /// an error. Cancellation surfaces as `Cancelled`.
    pub async fn retrieve(
        &self,
        query: &str,
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RaptorResult<RetrievalOutcome> {
        let span = retrieval_span!(query, config.mode);
        self.retrieve_inner(query, config, cancel).instrument(span).await
    }

    async fn retrieve_inner(
        &self,
        query: &str,
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RaptorResult<RetrievalOutcome> {
        let started = Instant::now();
        let mut state = StateMachine::start();

        let pool = match self.run_recall(query, config, cancel).await {
            Ok(pool) => pool,
            Err(e) => {
                state.advance(QueryState::Failed);
                return Err(e);
            }
        };
        let candidates_recalled = pool.len();
        state.advance(QueryState::DecidingRerank);

        let decision = self.decide(&pool, config);
        let (passages, decision, degradation) = match decision {
            Some(skip) => {
                state.advance(QueryState::SkippingRerank);
                events::rerank_skipped(skip_reason(&skip), pool.len());
                (recall_ordered(pool, config), skip, None)
            }
            None => {
                state.advance(QueryState::Reranking);
                match self.run_rerank(query, &pool, config, cancel).await {
                    Ok(reranked) => (reranked, RerankDecision::Reranked, None),
                    Err(e) if e.is_rerank_degradable() => {
                        let event = DegradationEvent::now(
                            COMPONENT_RERANK,
                            e.to_string(),
                            FALLBACK_RECALL_ORDER,
                        );
                        events::degradation_triggered(
                            &event.component,
                            &event.failure,
                            &event.fallback_used,
                        );
                        (recall_ordered(pool, config), RerankDecision::FellBack, Some(event))
                    }
                    Err(e) => {
                        state.advance(QueryState::Failed);
                        return Err(e);
                    }
                }
            }
        };

        state.advance(QueryState::Merging);
        let outcome = RetrievalOutcome {
            candidates_recalled,
            decision,
            degradation,
            latency: started.elapsed(),
            passages,
        };
        state.advance(QueryState::Done);

        info!(
            results = outcome.passages.len(),
            tokens = outcome.passages.total_tokens(),
            budget = config.max_tokens,
            decision = ?outcome.decision,
            latency_ms = outcome.latency.as_millis() as u64,
            "retrieval complete"
        );
        Ok(outcome)
    }

    /// Recall on the blocking pool, bounded by `recall_timeout_ms`.
    async fn run_recall(
        &self,
        query: &str,
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RaptorResult<Vec<CandidateNode>> {
        let engine = Arc::clone(&self.recall);
        let query = query.to_string();
        let snapshot = config.clone();
        let token = cancel.clone();
        let handle = tokio::task::spawn_blocking(move || {
            engine.recall_with_cancel(&query, &snapshot, &token)
        });
        match tokio::time::timeout(config.recall_timeout(), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(RaptorError::TaskFailed {
                reason: format!("recall task failed: {join}"),
            }),
            Err(_) => Err(RaptorError::RecallTimeout {
                timeout_ms: config.recall_timeout_ms,
            }),
        }
    }

    /// `Some(reason)` when rerank should be skipped, `None` to rerank.
    fn decide(&self, pool: &[CandidateNode], config: &RetrievalConfig) -> Option<RerankDecision> {
        if !config.rerank_enabled || self.gateway.is_none() {
            return Some(RerankDecision::Disabled);
        }
        if pool.len() <= config.top_k {
            return Some(RerankDecision::PoolTooSmall { pool: pool.len() });
        }
        let scores: Vec<f64> = pool.iter().map(|c| c.recall_score).collect();
        if !RerankGateway::should_rerank(&scores, config.rerank_score_spread_threshold) {
            return Some(RerankDecision::SpreadTooWide {
                spread: spread(&scores),
            });
        }
        None
    }

    async fn run_rerank(
        &self,
        query: &str,
        pool: &[CandidateNode],
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RaptorResult<RetrievedPassages> {
        let Some(gateway) = self.gateway.as_ref() else {
            return Err(RaptorError::RerankUnavailable {
                model: "none".into(),
                reason: "no rerank gateway attached".into(),
            });
        };
        if cancel.is_cancelled() {
            return Err(RaptorError::Cancelled {
                stage: "rerank".into(),
            });
        }
        let span = rerank_span!(gateway.model_name(), pool.len());
        let passages: Vec<Passage> = pool.iter().map(Passage::from).collect();
        let scores = gateway
            .batch_score(query, &passages, config, cancel)
            .instrument(span)
            .await?;

        let mut reranked: Vec<RerankedCandidate> = pool
            .iter()
            .zip(scores)
            .map(|(c, s)| RerankedCandidate::from_candidate(c, s))
            .collect();
        sort_by_rerank(&mut reranked);
        reranked.truncate(config.top_k);
        Ok(RetrievedPassages::Reranked(TokenBudget::admit_prefix(
            reranked,
            config.max_tokens,
        )))
    }
}

/// First `top_k` of the already budget-trimmed recall pool.
fn recall_ordered(mut pool: Vec<CandidateNode>, config: &RetrievalConfig) -> RetrievedPassages {
    pool.truncate(config.top_k);
    RetrievedPassages::RecallOrdered(pool)
}

fn spread(scores: &[f64]) -> f64 {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

fn skip_reason(decision: &RerankDecision) -> &'static str {
    match decision {
        RerankDecision::Disabled => "disabled",
        RerankDecision::PoolTooSmall { .. } => "pool_too_small",
        RerankDecision::SpreadTooWide { .. } => "spread_too_wide",
        RerankDecision::Reranked | RerankDecision::FellBack => "none",
    }
}

impl std::fmt::Debug for FusionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FusionController")
            .field("recall", &self.recall)
            .field("gateway", &self.gateway)
            .finish()
    }
}
