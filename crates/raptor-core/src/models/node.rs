use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identifier of a node within one tree.
pub type NodeId = usize;

/// A chunk (level 0) or summary (level ≥ 1) of the pre-built tree.
///
/// Immutable once the index is built; queries only hold shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub text: String,
    /// Empty until the index build embeds it.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// 0 = leaf.
    pub level: usize,
    #[serde(default)]
    pub children: BTreeSet<NodeId>,
    #[serde(default)]
    pub parent: Option<NodeId>,
}

impl TreeNode {
    /// A leaf chunk with no children.
    pub fn leaf(id: NodeId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            embedding: Vec::new(),
            level: 0,
            children: BTreeSet::new(),
            parent: None,
        }
    }

    /// A summary node over `children` at `level`.
    pub fn summary(
        id: NodeId,
        text: impl Into<String>,
        level: usize,
        children: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            embedding: Vec::new(),
            level,
            children: children.into_iter().collect(),
            parent: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.level == 0
    }
}
