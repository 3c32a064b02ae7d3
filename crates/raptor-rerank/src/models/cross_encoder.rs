//! Cross-encoder reranking via fastembed's `TextRerank`.

use std::sync::Mutex;

use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::traits::IRerankModel;
use tracing::info;

/// ONNX cross-encoder. Inference needs exclusive access to the session, so
/// the gateway's worker pool is the real concurrency bound here.
pub struct CrossEncoderModel {
    name: String,
    model: Mutex<TextRerank>,
}

impl CrossEncoderModel {
    /// Load (downloading on first use) the model registered as `name`.
    pub fn load(name: &str) -> RaptorResult<Self> {
        let which = match name {
            super::BGE_RERANKER_BASE => RerankerModel::BGERerankerBase,
            super::BGE_RERANKER_V2_M3 => RerankerModel::BGERerankerV2M3,
            other => {
                return Err(RaptorError::InvalidConfig {
                    reason: format!("no cross-encoder named {other:?}"),
                })
            }
        };
        let model = TextRerank::try_new(RerankInitOptions::new(which)).map_err(|e| {
            RaptorError::RerankUnavailable {
                model: name.to_string(),
                reason: format!("failed to load: {e}"),
            }
        })?;
        info!(model = name, "cross-encoder loaded");
        Ok(Self {
            name: name.to_string(),
            model: Mutex::new(model),
        })
    }

    fn fault(&self, reason: impl Into<String>) -> RaptorError {
        RaptorError::RerankUnavailable {
            model: self.name.clone(),
            reason: reason.into(),
        }
    }
}

impl IRerankModel for CrossEncoderModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, query: &str, passage: &str) -> RaptorResult<f64> {
        let scores = self.score_batch(query, &[passage.to_string()])?;
        scores
            .first()
            .copied()
            .ok_or_else(|| self.fault("empty rerank result"))
    }

    fn score_batch(&self, query: &str, passages: &[String]) -> RaptorResult<Vec<f64>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }
        #[allow(unused_mut)]
        let mut model = self
            .model
            .lock()
            .map_err(|_| self.fault("cross-encoder lock poisoned"))?;
        let results = model
            .rerank(query.to_string(), passages.to_vec(), false, None)
            .map_err(|e| self.fault(format!("fastembed rerank failed: {e}")))?;

        // fastembed returns results sorted by score; restore input order.
        let mut scores = vec![f64::NAN; passages.len()];
        for result in results {
            if let Some(slot) = scores.get_mut(result.index) {
                *slot = result.score as f64;
            }
        }
        Ok(scores)
    }
}
