//! Deterministic orderings shared by recall and merge.

use std::cmp::Ordering;

use raptor_core::models::{NodeId, RerankedCandidate};

/// Recall order: score descending, then lower node id.
pub fn recall_order(a: &(NodeId, f64), b: &(NodeId, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

pub fn sort_by_recall(scored: &mut [(NodeId, f64)]) {
    scored.sort_by(recall_order);
}

/// Final order after rerank: rerank score descending, then recall score
/// descending, then lower node id.
pub fn rerank_order(a: &RerankedCandidate, b: &RerankedCandidate) -> Ordering {
    b.rerank_score
        .total_cmp(&a.rerank_score)
        .then_with(|| b.recall_score.total_cmp(&a.recall_score))
        .then_with(|| a.id().cmp(&b.id()))
}

pub fn sort_by_rerank(candidates: &mut [RerankedCandidate]) {
    candidates.sort_by(rerank_order);
}
