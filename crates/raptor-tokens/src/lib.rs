//! # raptor-tokens
//!
//! Exact token counting via `tiktoken-rs` (`cl100k_base`).
//! Caches results per content hash, and admits score-ordered items into a
//! fixed token budget.

pub mod budget;
pub mod counter;

pub use budget::TokenBudget;
pub use counter::TokenCounter;
