use std::sync::Arc;

use super::node::{NodeId, TreeNode};

/// Anything that occupies part of the token budget.
pub trait TokenWeighted {
    fn token_count(&self) -> usize;
}

/// A node surfaced by the recall stage together with its similarity to the query.
#[derive(Debug, Clone)]
pub struct CandidateNode {
    pub node: Arc<TreeNode>,
    /// Similarity from the tree index (higher = more relevant).
    pub recall_score: f64,
    /// Tokens of `node.text`, counted once during recall.
    pub token_count: usize,
}

impl CandidateNode {
    pub fn id(&self) -> NodeId {
        self.node.id
    }
}

impl TokenWeighted for CandidateNode {
    fn token_count(&self) -> usize {
        self.token_count
    }
}

/// A recalled node re-scored by the rerank model.
#[derive(Debug, Clone)]
pub struct RerankedCandidate {
    pub node: Arc<TreeNode>,
    /// Model-specific relevance, not normalized.
    pub rerank_score: f64,
    /// Score the node carried out of recall; used as the first tie-break.
    pub recall_score: f64,
    pub token_count: usize,
}

impl RerankedCandidate {
    pub fn from_candidate(candidate: &CandidateNode, rerank_score: f64) -> Self {
        Self {
            node: Arc::clone(&candidate.node),
            rerank_score,
            recall_score: candidate.recall_score,
            token_count: candidate.token_count,
        }
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }
}

impl TokenWeighted for RerankedCandidate {
    fn token_count(&self) -> usize {
        self.token_count
    }
}
