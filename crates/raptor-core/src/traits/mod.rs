mod embedding;
mod rerank_model;
mod tree_index;

pub use embedding::IEmbeddingProvider;
pub use rerank_model::IRerankModel;
pub use tree_index::ITreeIndex;
