use crate::errors::RaptorResult;

/// A pluggable relevance model (cross-encoder or lighter backend).
///
/// Calls may block for a long time; the rerank gateway runs them on the
/// blocking pool under a timeout. Any `Err` is treated as a model fault.
pub trait IRerankModel: Send + Sync {
    /// Stable backend name, also part of the score cache key.
    fn name(&self) -> &str;

    /// Relevance of `passage` to `query`. Range is model-specific.
    fn score(&self, query: &str, passage: &str) -> RaptorResult<f64>;

    /// Relevance of each passage, same order and length as `passages`.
    ///
    /// Backends without native batching inherit this loop.
    fn score_batch(&self, query: &str, passages: &[String]) -> RaptorResult<Vec<f64>> {
        passages.iter().map(|p| self.score(query, p)).collect()
    }

    fn is_available(&self) -> bool {
        true
    }
}
