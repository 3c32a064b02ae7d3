//! # raptor-rerank
//!
//! Second-stage scoring behind one contract.
//!
//! ```text
//! RerankGateway::batch_score
//! ├── RerankCache lookup   : (model, query, passage identity), LRU
//! ├── chunk misses         : rerank_batch_size passages per model call
//! ├── worker pool          : semaphore-bounded blocking tasks
//! ├── whole-call timeout   : outstanding chunks are abandoned on expiry
//! └── commit               : cache written only when every chunk succeeded
//! ```

pub mod cache;
pub mod gateway;
pub mod models;
pub mod passage;

pub use cache::{CacheStats, RerankCache, RerankKey};
pub use gateway::RerankGateway;
pub use models::{build_model, LexicalOverlapModel};
pub use passage::{Passage, PassageKey};
