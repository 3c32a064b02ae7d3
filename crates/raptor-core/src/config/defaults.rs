// Single source of truth for all default values.

// --- Recall ---
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_OVER_FETCH_FACTOR: usize = 3;
pub const DEFAULT_MAX_TOKENS: usize = 3_500;
pub const DEFAULT_SELECTION_THRESHOLD: f64 = 0.5;
pub const DEFAULT_RECALL_TIMEOUT_MS: u64 = 5_000;

// --- Rerank (per query) ---
pub const DEFAULT_RERANK_ENABLED: bool = false;
pub const DEFAULT_RERANK_BATCH_SIZE: usize = 32;
pub const DEFAULT_RERANK_SCORE_SPREAD_THRESHOLD: f64 = 0.1;
pub const DEFAULT_RERANK_TIMEOUT_MS: u64 = 2_000;

// --- Rerank (per gateway) ---
pub const DEFAULT_RERANK_MODEL_NAME: &str = "lexical-overlap";
pub const DEFAULT_RERANK_CACHE_CAPACITY: u64 = 10_000;
pub const DEFAULT_MAX_CONCURRENT_BATCHES: usize = 4;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;
