use std::collections::HashSet;

use raptor_core::errors::RaptorResult;
use raptor_core::traits::IRerankModel;

/// Dependency-free relevance: the share of distinct query terms that occur
/// in the passage, in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalOverlapModel;

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.len() >= 2)
        .map(str::to_lowercase)
        .collect()
}

impl IRerankModel for LexicalOverlapModel {
    fn name(&self) -> &str {
        super::LEXICAL_OVERLAP
    }

    fn score(&self, query: &str, passage: &str) -> RaptorResult<f64> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(0.0);
        }
        let passage_terms = terms(passage);
        let shared = query_terms.intersection(&passage_terms).count();
        Ok(shared as f64 / query_terms.len() as f64)
    }

    fn score_batch(&self, query: &str, passages: &[String]) -> RaptorResult<Vec<f64>> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(vec![0.0; passages.len()]);
        }
        Ok(passages
            .iter()
            .map(|p| {
                let shared = query_terms.intersection(&terms(p)).count();
                shared as f64 / query_terms.len() as f64
            })
            .collect())
    }
}
