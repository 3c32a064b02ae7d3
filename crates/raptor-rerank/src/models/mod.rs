//! Rerank model backends and the name registry.

#[cfg(feature = "reranker")]
mod cross_encoder;
mod lexical;

use std::sync::Arc;

use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::traits::IRerankModel;

#[cfg(feature = "reranker")]
pub use cross_encoder::CrossEncoderModel;
pub use lexical::LexicalOverlapModel;

pub const LEXICAL_OVERLAP: &str = "lexical-overlap";
pub const BGE_RERANKER_BASE: &str = "bge-reranker-base";
pub const BGE_RERANKER_V2_M3: &str = "bge-reranker-v2-m3";

/// Construct the backend registered under `name`.
pub fn build_model(name: &str) -> RaptorResult<Arc<dyn IRerankModel>> {
    match name {
        LEXICAL_OVERLAP => Ok(Arc::new(LexicalOverlapModel)),
        BGE_RERANKER_BASE | BGE_RERANKER_V2_M3 => cross_encoder_for(name),
        other => Err(RaptorError::InvalidConfig {
            reason: format!("unknown rerank model {other:?}"),
        }),
    }
}

#[cfg(feature = "reranker")]
fn cross_encoder_for(name: &str) -> RaptorResult<Arc<dyn IRerankModel>> {
    Ok(Arc::new(CrossEncoderModel::load(name)?))
}

#[cfg(not(feature = "reranker"))]
fn cross_encoder_for(name: &str) -> RaptorResult<Arc<dyn IRerankModel>> {
    Err(RaptorError::InvalidConfig {
        reason: format!("rerank model {name:?} requires the `reranker` feature"),
    })
}
