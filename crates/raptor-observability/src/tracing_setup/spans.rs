//! Span definitions per operation: retrieval, recall, rerank.

/// Create a retrieval span.
#[macro_export]
macro_rules! retrieval_span {
    ($query:expr, $mode:expr) => {
        tracing::info_span!("raptor.retrieval", query = %$query, mode = ?$mode)
    };
}

/// Create a recall span.
#[macro_export]
macro_rules! recall_span {
    ($mode:expr, $limit:expr) => {
        tracing::info_span!("raptor.recall", mode = ?$mode, limit = $limit)
    };
}

/// Create a rerank span.
#[macro_export]
macro_rules! rerank_span {
    ($model:expr, $passages:expr) => {
        tracing::info_span!("raptor.rerank", model = %$model, passages = $passages)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const RETRIEVAL: &str = "raptor.retrieval";
    pub const RECALL: &str = "raptor.recall";
    pub const RERANK: &str = "raptor.rerank";
}
