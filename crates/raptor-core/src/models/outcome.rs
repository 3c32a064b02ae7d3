use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::candidate::{CandidateNode, RerankedCandidate};
use super::degradation_event::DegradationEvent;
use super::node::{NodeId, TreeNode};

/// Why the rerank stage did or did not shape the final order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RerankDecision {
    /// `rerank_enabled` is false or no gateway is attached.
    Disabled,
    /// The recall pool holds no more than `top_k` nodes.
    PoolTooSmall { pool: usize },
    /// Recall scores already spread at least the threshold apart.
    SpreadTooWide { spread: f64 },
    /// The rerank model ordered the result.
    Reranked,
    /// The rerank model was unavailable; the recall order was used.
    FellBack,
}

/// Final passages, typed by whether rerank ran.
#[derive(Debug, Clone)]
pub enum RetrievedPassages {
    Reranked(Vec<RerankedCandidate>),
    RecallOrdered(Vec<CandidateNode>),
}

/// Where a returned node sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub node_index: NodeId,
    pub layer_number: usize,
}

impl RetrievedPassages {
    pub fn len(&self) -> usize {
        match self {
            Self::Reranked(items) => items.len(),
            Self::RecallOrdered(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_reranked(&self) -> bool {
        matches!(self, Self::Reranked(_))
    }

    /// Nodes in final order.
    pub fn nodes(&self) -> Vec<&TreeNode> {
        match self {
            Self::Reranked(items) => items.iter().map(|c| c.node.as_ref()).collect(),
            Self::RecallOrdered(items) => items.iter().map(|c| c.node.as_ref()).collect(),
        }
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().into_iter().map(|n| n.id).collect()
    }

    pub fn total_tokens(&self) -> usize {
        match self {
            Self::Reranked(items) => items.iter().map(|c| c.token_count).sum(),
            Self::RecallOrdered(items) => items.iter().map(|c| c.token_count).sum(),
        }
    }

    /// Passage texts joined for a generation prompt: line breaks inside a passage
    /// become spaces, and every passage ends with a blank line.
    pub fn context(&self) -> String {
        let mut out = String::new();
        for node in self.nodes() {
            let flattened: Vec<&str> = node.text.lines().collect();
            out.push_str(&flattened.join(" "));
            out.push_str("\n\n");
        }
        out
    }

    pub fn layer_information(&self) -> Vec<LayerInfo> {
        self.nodes()
            .into_iter()
            .map(|n| LayerInfo {
                node_index: n.id,
                layer_number: n.level,
            })
            .collect()
    }
}

/// Everything one `retrieve` call produced.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub passages: RetrievedPassages,
    pub decision: RerankDecision,
    /// Size of the budget-trimmed recall pool.
    pub candidates_recalled: usize,
    /// Set when the rerank stage degraded to the recall order.
    pub degradation: Option<DegradationEvent>,
    pub latency: Duration,
}
