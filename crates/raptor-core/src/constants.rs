/// Component name used in rerank degradation events and logs.
pub const COMPONENT_RERANK: &str = "rerank";

/// Fallback label recorded when rerank degrades.
pub const FALLBACK_RECALL_ORDER: &str = "recall-order";
