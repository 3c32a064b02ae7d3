//! # raptor-core
//!
//! Foundation crate for the RAPTOR retrieval pipeline.
//! Defines the tree data model, boundary traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod cancellation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use cancellation::CancellationToken;
pub use config::{RaptorConfig, RetrievalConfig, RerankConfig, SelectionMode, TraversalMode};
pub use errors::{RaptorError, RaptorResult};
pub use models::{CandidateNode, NodeId, RerankedCandidate, TreeNode};
