use std::collections::BTreeSet;

use raptor_core::cancellation::CancellationToken;
use raptor_core::config::{RetrievalConfig, SelectionMode};
use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::models::NodeId;
use raptor_core::traits::ITreeIndex;
use tracing::debug;

use crate::ranking::sort_by_recall;

/// Top-down traversal.
///
/// Starts at `start_layer` (default: the top layer), scores only the nodes on
/// the current frontier, keeps up to M of them, and descends into the
/// children of the kept nodes for at most `num_layers` layers. Every kept
/// node, summary or leaf, is returned with its score.
pub(super) fn traverse(
    index: &dyn ITreeIndex,
    query: &str,
    config: &RetrievalConfig,
    cancel: &CancellationToken,
) -> RaptorResult<Vec<(NodeId, f64)>> {
    let layers = index.num_layers()?;
    let top = layers.saturating_sub(1);
    let start = config.start_layer.unwrap_or(top);
    if start >= layers {
        return Err(invalid(format!(
            "start_layer {start} is beyond the top layer {top}"
        )));
    }
    let depth = config.num_layers.unwrap_or(start + 1);
    if depth > start + 1 {
        return Err(invalid(format!(
            "num_layers {depth} exceeds the {} layers at or below start_layer {start}",
            start + 1
        )));
    }
    let fan_out = config.effective_fan_out()?;

    let mut frontier = if start == top {
        index.get_roots()
    } else {
        index.layer_nodes(start)?
    };
    let mut kept_all = Vec::new();

    for step in 0..depth {
        if cancel.is_cancelled() {
            return Err(super::cancelled());
        }
        if frontier.is_empty() {
            break;
        }
        let scores = index.similarity_batch(query, &frontier)?;
        let mut layer: Vec<(NodeId, f64)> = frontier
            .iter()
            .copied()
            .zip(scores)
            .filter(|(_, s)| s.is_finite())
            .collect();
        sort_by_recall(&mut layer);
        let kept = select(layer, config.selection, fan_out);
        debug!(
            layer = start - step,
            frontier = frontier.len(),
            kept = kept.len(),
            "layer traversed"
        );

        if step + 1 < depth {
            let mut next = BTreeSet::new();
            for (id, _) in &kept {
                next.extend(index.get_children(*id)?);
            }
            frontier = next.into_iter().collect();
        }
        kept_all.extend(kept);
    }

    Ok(kept_all)
}

/// Apply the per-layer selection rule to a layer already in recall order.
fn select(layer: Vec<(NodeId, f64)>, mode: SelectionMode, fan_out: usize) -> Vec<(NodeId, f64)> {
    match mode {
        SelectionMode::TopK => layer.into_iter().take(fan_out).collect(),
        SelectionMode::Threshold { threshold } => layer
            .into_iter()
            .filter(|(_, s)| *s > threshold)
            .take(fan_out)
            .collect(),
    }
}

fn invalid(reason: String) -> RaptorError {
    RaptorError::InvalidConfig { reason }
}
