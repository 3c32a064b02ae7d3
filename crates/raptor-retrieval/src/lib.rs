//! # raptor-retrieval
//!
//! The query engine. Two-stage pipeline: tree recall with over-fetch, then
//! optional reranking, merged back under the token budget.
//!
//! ## Architecture
//!
//! ```text
//! FusionController
//! ├── TreeRecallEngine
//! │   ├── Collapsed (every node, one pass)
//! │   ├── Layered (top-down, per-layer fan-out)
//! │   └── Budget trim (score-order prefix)
//! ├── Rerank decision
//! │   ├── rerank_enabled / gateway attached
//! │   ├── pool larger than top_k
//! │   └── recall score spread below threshold
//! ├── RerankGateway (raptor-rerank)
//! └── Merge
//!     ├── Sort (rerank desc, recall desc, id asc)
//!     ├── Truncate to top_k
//!     ├── Budget re-trim
//!     └── Fallback to recall order on RerankUnavailable
//! ```

pub mod fusion;
pub mod ranking;
pub mod recall;

pub use fusion::FusionController;
pub use recall::TreeRecallEngine;
