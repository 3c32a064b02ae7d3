//! Structured log events for key pipeline operations.
//!
//! Each function emits a `tracing` event with structured fields.

/// Log completion of the recall stage.
pub fn recall_completed(mode: &str, scored: usize, returned: usize, tokens: usize) {
    tracing::info!(
        event = "recall_completed",
        mode = %mode,
        scored = scored,
        returned = returned,
        tokens = tokens,
        "recall completed"
    );
}

/// Log a skipped rerank and why.
pub fn rerank_skipped(reason: &str, pool: usize) {
    tracing::debug!(
        event = "rerank_skipped",
        reason = %reason,
        pool = pool,
        "rerank skipped"
    );
}

/// Log a completed rerank pass.
pub fn rerank_completed(model: &str, passages: usize, cache_hits: usize, batches: usize) {
    tracing::info!(
        event = "rerank_completed",
        model = %model,
        passages = passages,
        cache_hits = cache_hits,
        batches = batches,
        "rerank completed"
    );
}

/// Log a degradation trigger event.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}

/// Log a cache invariant violation.
pub fn cache_corruption_detected(details: &str) {
    tracing::error!(
        event = "cache_corruption_detected",
        details = %details,
        "rerank cache corruption detected"
    );
}

/// Log a query state transition.
pub fn query_state(from: &str, to: &str) {
    tracing::debug!(event = "query_state", from = %from, to = %to, "query state transition");
}
