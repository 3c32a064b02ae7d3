use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use raptor_core::errors::{EmbeddingError, IndexError, RaptorError, RaptorResult};
use raptor_core::models::{LeafInfo, NodeId, SummaryInfo, TreeNode, TreeSummary};
use raptor_core::traits::{IEmbeddingProvider, ITreeIndex};

use crate::query_cache::QueryCache;
use crate::similarity::cosine_similarity;
use crate::validation;

const DEFAULT_QUERY_CACHE_CAPACITY: u64 = 1_024;

/// Immutable, fully embedded summarization tree held in memory.
///
/// Built once, then shared behind an `Arc` by every query. Only the query
/// embedding cache changes after construction.
pub struct InMemoryTree {
    nodes: BTreeMap<NodeId, Arc<TreeNode>>,
    /// Node ids per level, ascending.
    layers: Vec<Vec<NodeId>>,
    embedder: Arc<dyn IEmbeddingProvider>,
    query_cache: QueryCache,
}

impl InMemoryTree {
    /// Validate `nodes`, embed any that arrive without a vector, and freeze.
    pub fn build(nodes: Vec<TreeNode>, embedder: Arc<dyn IEmbeddingProvider>) -> RaptorResult<Self> {
        let (mut by_id, top_level) = validation::validate(nodes)?;
        let dims = embedder.dimensions();

        let missing: Vec<NodeId> = by_id
            .values()
            .filter(|n| n.embedding.is_empty())
            .map(|n| n.id)
            .collect();
        if !missing.is_empty() {
            if !embedder.is_available() {
                return Err(EmbeddingError::ProviderUnavailable {
                    provider: embedder.name().to_string(),
                }
                .into());
            }
            let texts: Vec<String> = missing.iter().map(|id| by_id[id].text.clone()).collect();
            let vectors = embedder.embed_batch(&texts)?;
            if vectors.len() != missing.len() {
                return Err(EmbeddingError::InferenceFailed {
                    reason: format!(
                        "{} returned {} vectors for {} texts",
                        embedder.name(),
                        vectors.len(),
                        missing.len()
                    ),
                }
                .into());
            }
            for (id, vector) in missing.iter().zip(vectors) {
                if let Some(node) = by_id.get_mut(id) {
                    node.embedding = vector;
                }
            }
        }

        for node in by_id.values() {
            if node.embedding.len() != dims {
                return Err(IndexError::EmbeddingDimension {
                    id: node.id,
                    expected: dims,
                    actual: node.embedding.len(),
                }
                .into());
            }
        }

        let mut layers = vec![Vec::new(); if by_id.is_empty() { 0 } else { top_level + 1 }];
        for node in by_id.values() {
            layers[node.level].push(node.id);
        }

        info!(
            nodes = by_id.len(),
            layers = layers.len(),
            embedded = missing.len(),
            provider = embedder.name(),
            "tree index built"
        );

        Ok(Self {
            nodes: by_id.into_iter().map(|(id, n)| (id, Arc::new(n))).collect(),
            layers,
            embedder,
            query_cache: QueryCache::new(DEFAULT_QUERY_CACHE_CAPACITY),
        })
    }

    /// Build from a JSON array of nodes.
    pub fn from_json(json: &str, embedder: Arc<dyn IEmbeddingProvider>) -> RaptorResult<Self> {
        let nodes: Vec<TreeNode> = serde_json::from_str(json)?;
        Self::build(nodes, embedder)
    }

    /// Leaves, summaries grouped by layer, and totals.
    pub fn summary(&self) -> TreeSummary {
        let mut leaf_nodes = Vec::new();
        let mut summary_nodes: BTreeMap<usize, Vec<SummaryInfo>> = BTreeMap::new();
        for node in self.nodes.values() {
            if node.is_leaf() {
                leaf_nodes.push(LeafInfo {
                    index: node.id,
                    text: node.text.clone(),
                });
            } else {
                summary_nodes.entry(node.level).or_default().push(SummaryInfo {
                    index: node.id,
                    text: node.text.clone(),
                    children: node.children.iter().copied().collect(),
                });
            }
        }
        TreeSummary {
            leaf_nodes,
            summary_nodes,
            num_layers: self.layers.len(),
            total_nodes: self.nodes.len(),
        }
    }

    pub fn query_cache(&self) -> &QueryCache {
        &self.query_cache
    }

    fn query_embedding(&self, query: &str) -> RaptorResult<Arc<Vec<f32>>> {
        let key = QueryCache::key(query);
        if let Some(hit) = self.query_cache.get(&key) {
            return Ok(hit);
        }
        let vector = self.embedder.embed(query)?;
        let expected = self.embedder.dimensions();
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }
            .into());
        }
        debug!(provider = self.embedder.name(), "query embedded");
        let vector = Arc::new(vector);
        self.query_cache.insert(key, Arc::clone(&vector));
        Ok(vector)
    }

    fn node(&self, id: NodeId) -> RaptorResult<&Arc<TreeNode>> {
        self.nodes.get(&id).ok_or(RaptorError::NodeNotFound { id })
    }
}

impl ITreeIndex for InMemoryTree {
    fn get_node(&self, id: NodeId) -> RaptorResult<Arc<TreeNode>> {
        self.node(id).cloned()
    }

    fn get_children(&self, id: NodeId) -> RaptorResult<Vec<NodeId>> {
        Ok(self.node(id)?.children.iter().copied().collect())
    }

    fn get_roots(&self) -> Vec<NodeId> {
        self.layers.last().cloned().unwrap_or_default()
    }

    fn similarity(&self, query: &str, id: NodeId) -> RaptorResult<f64> {
        let node = self.node(id)?;
        let q = self.query_embedding(query)?;
        Ok(cosine_similarity(&q, &node.embedding))
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn similarity_batch(&self, query: &str, ids: &[NodeId]) -> RaptorResult<Vec<f64>> {
        let q = self.query_embedding(query)?;
        ids.par_iter()
            .map(|&id| self.node(id).map(|n| cosine_similarity(&q, &n.embedding)))
            .collect()
    }

    fn all_node_ids(&self) -> RaptorResult<Vec<NodeId>> {
        Ok(self.nodes.keys().copied().collect())
    }

    fn layer_nodes(&self, layer: usize) -> RaptorResult<Vec<NodeId>> {
        Ok(self.layers.get(layer).cloned().unwrap_or_default())
    }

    fn num_layers(&self) -> RaptorResult<usize> {
        Ok(self.layers.len())
    }
}

impl std::fmt::Debug for InMemoryTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTree")
            .field("nodes", &self.nodes.len())
            .field("layers", &self.layers.len())
            .field("embedder", &self.embedder.name())
            .finish()
    }
}
