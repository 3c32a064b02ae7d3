use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use crate::errors::RaptorResult;
use crate::models::{NodeId, TreeNode};

/// Read-only handle over a finished summarization tree.
///
/// Implementations must never mutate the tree while queries hold it. The
/// similarity calls are the potentially slow part and are invoked off the
/// async executor by the recall stage.
pub trait ITreeIndex: Send + Sync {
    fn get_node(&self, id: NodeId) -> RaptorResult<Arc<TreeNode>>;

    fn get_children(&self, id: NodeId) -> RaptorResult<Vec<NodeId>>;

    /// Nodes of the top layer.
    fn get_roots(&self) -> Vec<NodeId>;

    /// Similarity of `query` to the stored embedding of `id` (higher = closer).
    fn similarity(&self, query: &str, id: NodeId) -> RaptorResult<f64>;

    /// Total number of nodes across all layers.
    fn node_count(&self) -> usize;

    /// Score many nodes for one query, in input order.
    fn similarity_batch(&self, query: &str, ids: &[NodeId]) -> RaptorResult<Vec<f64>> {
        ids.iter().map(|&id| self.similarity(query, id)).collect()
    }

    /// Every node id reachable from the roots, in breadth-first order.
    fn all_node_ids(&self) -> RaptorResult<Vec<NodeId>> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<NodeId> = self.get_roots().into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            queue.extend(self.get_children(id)?);
        }
        Ok(order)
    }

    /// Node ids whose level equals `layer`.
    fn layer_nodes(&self, layer: usize) -> RaptorResult<Vec<NodeId>> {
        let mut out = Vec::new();
        for id in self.all_node_ids()? {
            if self.get_node(id)?.level == layer {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Number of layers, leaves included (top level + 1). Zero for an empty tree.
    fn num_layers(&self) -> RaptorResult<usize> {
        let mut top = None;
        for id in self.get_roots() {
            let level = self.get_node(id)?.level;
            top = Some(top.map_or(level, |t: usize| t.max(level)));
        }
        Ok(top.map_or(0, |t| t + 1))
    }
}
