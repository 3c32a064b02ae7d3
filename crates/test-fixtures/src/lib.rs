//! Test fixtures for the RAPTOR workspace: golden datasets, a scripted tree
//! index, a model-free embedder, and mock rerank models.

mod embedder;
mod models;
mod scripted_tree;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;

use raptor_core::config::TraversalMode;
use raptor_core::models::TreeNode;

pub use embedder::TermHashEmbedder;
pub use models::{CountingModel, FailingModel, ReverseRecallModel, SlowModel};
pub use scripted_tree::ScriptedTree;

/// Root directory of the golden JSON files.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Nine-node, three-layer tree over two fairy tales.
///
/// Leaves 0-2 and summary 6 cover Cinderella; leaves 3-5 and summary 7 cover
/// the three little pigs; node 8 is the single root.
pub fn fairy_tale_nodes() -> Vec<TreeNode> {
    load_fixture("fairy_tale_tree.json")
}

/// One golden query against [`fairy_tale_nodes`].
#[derive(Debug, Clone, Deserialize)]
pub struct GoldenQuery {
    pub query: String,
    pub mode: TraversalMode,
    pub top_k: usize,
    #[serde(default)]
    pub layer_fan_out: Option<usize>,
    /// Node ids in final order.
    pub expected: Vec<usize>,
}

pub fn fairy_tale_queries() -> Vec<GoldenQuery> {
    load_fixture("fairy_tale_queries.json")
}
