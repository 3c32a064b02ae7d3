//! Tree Recall Engine: over-fetched, budget-trimmed candidates for one query.

mod collapsed;
mod layered;

use std::sync::Arc;

use raptor_core::cancellation::CancellationToken;
use raptor_core::config::{RetrievalConfig, TraversalMode};
use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::models::{CandidateNode, NodeId};
use raptor_core::traits::ITreeIndex;
use raptor_observability::{events, recall_span};
use raptor_tokens::{TokenBudget, TokenCounter};
use tracing::warn;

use crate::ranking::sort_by_recall;

/// Recall stage over a read-only tree index.
pub struct TreeRecallEngine {
    index: Arc<dyn ITreeIndex>,
    counter: Arc<TokenCounter>,
}

impl TreeRecallEngine {
    pub fn new(index: Arc<dyn ITreeIndex>, counter: Arc<TokenCounter>) -> Self {
        Self { index, counter }
    }

    pub fn index(&self) -> &Arc<dyn ITreeIndex> {
        &self.index
    }

    /// Up to `top_k × over_fetch_factor` candidates, by descending recall
    /// score, admitted in that order until the next would exceed `max_tokens`.
    pub fn recall(&self, query: &str, config: &RetrievalConfig) -> RaptorResult<Vec<CandidateNode>> {
        self.recall_with_cancel(query, config, &CancellationToken::new())
    }

    pub fn recall_with_cancel(
        &self,
        query: &str,
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RaptorResult<Vec<CandidateNode>> {
        config.validate()?;
        if self.index.node_count() == 0 {
            return Err(RaptorError::EmptyIndex);
        }
        let limit = config.recall_limit()?;
        let _span = recall_span!(config.mode, limit).entered();

        if cancel.is_cancelled() {
            return Err(cancelled());
        }
        let scored = match config.mode {
            TraversalMode::Collapsed => collapsed::score_all(self.index.as_ref(), query)?,
            TraversalMode::Layered => {
                layered::traverse(self.index.as_ref(), query, config, cancel)?
            }
        };
        let scored_count = scored.len();

        let mut ranked = finite_only(scored);
        sort_by_recall(&mut ranked);
        ranked.truncate(limit);

        let candidates = ranked
            .into_iter()
            .map(|(id, recall_score)| {
                let node = self.index.get_node(id)?;
                let token_count = self.counter.count_cached(&node.text);
                Ok(CandidateNode {
                    node,
                    recall_score,
                    token_count,
                })
            })
            .collect::<RaptorResult<Vec<_>>>()?;

        let admitted = TokenBudget::admit_prefix(candidates, config.max_tokens);
        events::recall_completed(
            mode_name(config.mode),
            scored_count,
            admitted.len(),
            admitted.iter().map(|c| c.token_count).sum(),
        );
        Ok(admitted)
    }
}

fn finite_only(scored: Vec<(NodeId, f64)>) -> Vec<(NodeId, f64)> {
    let before = scored.len();
    let kept: Vec<_> = scored.into_iter().filter(|(_, s)| s.is_finite()).collect();
    if kept.len() < before {
        warn!(dropped = before - kept.len(), "non-finite similarity scores dropped");
    }
    kept
}

pub(crate) fn mode_name(mode: TraversalMode) -> &'static str {
    match mode {
        TraversalMode::Collapsed => "collapsed",
        TraversalMode::Layered => "layered",
    }
}

pub(crate) fn cancelled() -> RaptorError {
    RaptorError::Cancelled {
        stage: "recall".into(),
    }
}

impl std::fmt::Debug for TreeRecallEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeRecallEngine")
            .field("nodes", &self.index.node_count())
            .finish()
    }
}
