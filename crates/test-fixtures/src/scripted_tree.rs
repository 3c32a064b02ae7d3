use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::models::{NodeId, TreeNode};
use raptor_core::traits::ITreeIndex;

/// Tree index whose similarities are fixed up front, independent of the query.
pub struct ScriptedTree {
    nodes: BTreeMap<NodeId, Arc<TreeNode>>,
    roots: Vec<NodeId>,
    scores: HashMap<NodeId, f64>,
    delay: Option<Duration>,
    similarity_calls: AtomicUsize,
}

impl ScriptedTree {
    /// Roots are the nodes on the highest level present.
    pub fn new(nodes: Vec<TreeNode>, scores: impl IntoIterator<Item = (NodeId, f64)>) -> Self {
        let top = nodes.iter().map(|n| n.level).max().unwrap_or(0);
        let roots = nodes.iter().filter(|n| n.level == top).map(|n| n.id).collect();
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, Arc::new(n))).collect(),
            roots,
            scores: scores.into_iter().collect(),
            delay: None,
            similarity_calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), [])
    }

    /// `n` leaves with text `"leaf {i}"`, leaf `i` scoring `0.9 - step * i`.
    pub fn descending_leaves(n: usize, step: f64) -> Self {
        let nodes = (0..n).map(|i| TreeNode::leaf(i, format!("leaf {i}"))).collect();
        let scores = (0..n).map(|i| (i, 0.9 - step * i as f64)).collect::<Vec<_>>();
        Self::new(nodes, scores)
    }

    /// Sleep for `delay` in every similarity call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn similarity_calls(&self) -> usize {
        self.similarity_calls.load(Ordering::SeqCst)
    }
}

impl ITreeIndex for ScriptedTree {
    fn get_node(&self, id: NodeId) -> RaptorResult<Arc<TreeNode>> {
        self.nodes
            .get(&id)
            .cloned()
            .ok_or(RaptorError::NodeNotFound { id })
    }

    fn get_children(&self, id: NodeId) -> RaptorResult<Vec<NodeId>> {
        Ok(self.get_node(id)?.children.iter().copied().collect())
    }

    fn get_roots(&self) -> Vec<NodeId> {
        self.roots.clone()
    }

    fn similarity(&self, _query: &str, id: NodeId) -> RaptorResult<f64> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if !self.nodes.contains_key(&id) {
            return Err(RaptorError::NodeNotFound { id });
        }
        Ok(self.scores.get(&id).copied().unwrap_or(0.0))
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
