//! # raptor-index
//!
//! Read-only tree index consumed by the recall stage.
//!
//! ```text
//! InMemoryTree
//! ├── validation    : ids, child levels, parent pointers, orphans
//! ├── embedding     : nodes without a vector are embedded at build time
//! ├── QueryCache    : one embedding per distinct query (blake3 key, moka)
//! └── similarity    : cosine over stored vectors, parallel via rayon
//! ```

pub mod query_cache;
pub mod similarity;
pub mod tree;
mod validation;

pub use query_cache::QueryCache;
pub use tree::InMemoryTree;
