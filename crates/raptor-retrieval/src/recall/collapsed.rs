use raptor_core::errors::RaptorResult;
use raptor_core::models::NodeId;
use raptor_core::traits::ITreeIndex;

/// Score every node of every layer against `query`.
pub(super) fn score_all(index: &dyn ITreeIndex, query: &str) -> RaptorResult<Vec<(NodeId, f64)>> {
    let ids = index.all_node_ids()?;
    let scores = index.similarity_batch(query, &ids)?;
    Ok(ids.into_iter().zip(scores).collect())
}
