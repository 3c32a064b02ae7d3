use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// A leaf chunk as reported by [`TreeSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafInfo {
    pub index: NodeId,
    pub text: String,
}

/// A summary node as reported by [`TreeSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryInfo {
    pub index: NodeId,
    pub text: String,
    pub children: Vec<NodeId>,
}

/// Structural report of a tree: leaves, summaries grouped by layer, and totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSummary {
    pub leaf_nodes: Vec<LeafInfo>,
    /// Layer number → summary nodes of that layer (layers ≥ 1 only).
    pub summary_nodes: BTreeMap<usize, Vec<SummaryInfo>>,
    pub num_layers: usize,
    pub total_nodes: usize,
}
