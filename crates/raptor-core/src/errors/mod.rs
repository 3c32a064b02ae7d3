mod embedding_error;
mod index_error;

pub use embedding_error::EmbeddingError;
pub use index_error::IndexError;

use crate::models::NodeId;

/// Unified error type for the retrieval pipeline.
///
/// `EmptyIndex`, `InvalidConfig` and `CacheCorruption` are fatal and always reach
/// the caller. `RerankUnavailable` is absorbed by the fusion controller, which
/// falls back to the recall order.
#[derive(Debug, thiserror::Error)]
pub enum RaptorError {
    #[error("tree index contains no nodes")]
    EmptyIndex,

    #[error("invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("rerank model {model} unavailable: {reason}")]
    RerankUnavailable { model: String, reason: String },

    #[error("rerank cache corruption: {details}")]
    CacheCorruption { details: String },

    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("recall timed out after {timeout_ms}ms")]
    RecallTimeout { timeout_ms: u64 },

    #[error("query cancelled during {stage}")]
    Cancelled { stage: String },

    #[error("tokenizer unavailable: {reason}")]
    TokenizerUnavailable { reason: String },

    #[error("background task failed: {reason}")]
    TaskFailed { reason: String },

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("index error: {0}")]
    IndexError(#[from] IndexError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RaptorError {
    /// Whether the fusion controller may absorb this error by degrading.
    pub fn is_rerank_degradable(&self) -> bool {
        matches!(self, Self::RerankUnavailable { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type RaptorResult<T> = Result<T, RaptorError>;
