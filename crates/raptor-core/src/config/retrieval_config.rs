use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::{RaptorError, RaptorResult};

/// How the recall stage walks the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraversalMode {
    /// Score every node of every layer in one pass.
    #[default]
    Collapsed,
    /// Start at the top layer and descend through the children of selected nodes.
    Layered,
}

/// Per-layer selection rule used by layered traversal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionMode {
    /// Keep the best `layer_fan_out` nodes of each layer.
    #[default]
    TopK,
    /// Keep nodes whose similarity is strictly above `threshold`, capped at `layer_fan_out`.
    Threshold { threshold: f64 },
}

impl SelectionMode {
    /// Threshold selection with the default similarity cut-off.
    pub fn threshold() -> Self {
        Self::Threshold {
            threshold: defaults::DEFAULT_SELECTION_THRESHOLD,
        }
    }
}

/// Immutable per-query retrieval configuration.
///
/// One snapshot is passed into every `recall`/`retrieve` call, so concurrent
/// queries with different settings never observe each other's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Final result size bound. Must be ≥ 1.
    pub top_k: usize,
    /// Recall pool multiplier applied to `top_k`. Must be ≥ 1.
    pub over_fetch_factor: usize,
    /// Cumulative token bound of the final result.
    pub max_tokens: usize,
    /// Collapsed or layered traversal.
    pub mode: TraversalMode,
    /// Per-layer fan-out M for layered traversal. `None` means `top_k × over_fetch_factor`.
    pub layer_fan_out: Option<usize>,
    /// Per-layer selection rule for layered traversal.
    pub selection: SelectionMode,
    /// Layer the layered traversal starts from. `None` means the top layer.
    pub start_layer: Option<usize>,
    /// Number of layers the layered traversal may visit. `None` means down to the leaves.
    pub num_layers: Option<usize>,
    /// Whether the rerank stage may run at all.
    pub rerank_enabled: bool,
    /// Passages per underlying model invocation.
    pub rerank_batch_size: usize,
    /// Rerank only runs when the recall score spread is below this value.
    pub rerank_score_spread_threshold: f64,
    /// Bound on the whole `batch_score` call (milliseconds).
    pub rerank_timeout_ms: u64,
    /// Bound on the recall stage (milliseconds).
    pub recall_timeout_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: defaults::DEFAULT_TOP_K,
            over_fetch_factor: defaults::DEFAULT_OVER_FETCH_FACTOR,
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
            mode: TraversalMode::default(),
            layer_fan_out: None,
            selection: SelectionMode::default(),
            start_layer: None,
            num_layers: None,
            rerank_enabled: defaults::DEFAULT_RERANK_ENABLED,
            rerank_batch_size: defaults::DEFAULT_RERANK_BATCH_SIZE,
            rerank_score_spread_threshold: defaults::DEFAULT_RERANK_SCORE_SPREAD_THRESHOLD,
            rerank_timeout_ms: defaults::DEFAULT_RERANK_TIMEOUT_MS,
            recall_timeout_ms: defaults::DEFAULT_RECALL_TIMEOUT_MS,
        }
    }
}

impl RetrievalConfig {
    /// Reject invalid parameter combinations. Nothing is clamped.
    pub fn validate(&self) -> RaptorResult<()> {
        if self.top_k < 1 {
            return Err(invalid("top_k must be >= 1"));
        }
        if self.over_fetch_factor < 1 {
            return Err(invalid("over_fetch_factor must be >= 1"));
        }
        if !self.rerank_score_spread_threshold.is_finite()
            || self.rerank_score_spread_threshold < 0.0
        {
            return Err(invalid(format!(
                "rerank_score_spread_threshold must be finite and >= 0, got {}",
                self.rerank_score_spread_threshold
            )));
        }
        if self.rerank_batch_size < 1 {
            return Err(invalid("rerank_batch_size must be >= 1"));
        }
        if self.rerank_timeout_ms == 0 {
            return Err(invalid("rerank_timeout_ms must be > 0"));
        }
        if self.recall_timeout_ms == 0 {
            return Err(invalid("recall_timeout_ms must be > 0"));
        }
        if self.layer_fan_out == Some(0) {
            return Err(invalid("layer_fan_out must be >= 1 when set"));
        }
        if self.num_layers == Some(0) {
            return Err(invalid("num_layers must be >= 1 when set"));
        }
        if let SelectionMode::Threshold { threshold } = self.selection {
            if !threshold.is_finite() {
                return Err(invalid(format!(
                    "selection threshold must be finite, got {threshold}"
                )));
            }
        }
        self.recall_limit().map(|_| ())
    }

    /// Size of the over-fetched recall pool: `top_k × over_fetch_factor`.
    pub fn recall_limit(&self) -> RaptorResult<usize> {
        self.top_k
            .checked_mul(self.over_fetch_factor)
            .ok_or_else(|| invalid("top_k * over_fetch_factor overflows"))
    }

    /// Per-layer fan-out M for layered traversal.
    pub fn effective_fan_out(&self) -> RaptorResult<usize> {
        match self.layer_fan_out {
            Some(m) => Ok(m),
            None => self.recall_limit(),
        }
    }

    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_millis(self.rerank_timeout_ms)
    }

    pub fn recall_timeout(&self) -> Duration {
        Duration::from_millis(self.recall_timeout_ms)
    }
}

fn invalid(reason: impl Into<String>) -> RaptorError {
    RaptorError::InvalidConfig {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RetrievalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.recall_limit().unwrap(), 30);
        assert_eq!(config.effective_fan_out().unwrap(), 30);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let config = RetrievalConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RaptorError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn negative_spread_threshold_is_rejected_not_clamped() {
        let config = RetrievalConfig {
            rerank_score_spread_threshold: -0.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.rerank_score_spread_threshold, -0.5);
    }

    #[test]
    fn overflowing_pool_is_rejected() {
        let config = RetrievalConfig {
            top_k: usize::MAX,
            over_fetch_factor: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_fan_out_wins() {
        let config = RetrievalConfig {
            layer_fan_out: Some(2),
            ..Default::default()
        };
        assert_eq!(config.effective_fan_out().unwrap(), 2);
    }
}
