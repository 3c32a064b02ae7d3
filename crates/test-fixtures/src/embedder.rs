use std::collections::BTreeMap;

use raptor_core::errors::RaptorResult;
use raptor_core::traits::IEmbeddingProvider;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Embeds text as a normalised bag of hashed terms, so golden trees need no model.
///
/// A term `t` lands in bucket `fnv1a(t) % dims` with weight
/// `tf(t) / terms * (1 + ln len(t))`. Terms are lowercased runs of
/// alphanumerics and `_`, at least two bytes long.
#[derive(Debug, Clone, Copy)]
pub struct TermHashEmbedder {
    dims: usize,
}

impl TermHashEmbedder {
    pub const DEFAULT_DIMS: usize = 256;

    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn bucket(&self, term: &str) -> usize {
        let hash = term
            .bytes()
            .fold(FNV_OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME));
        (hash % self.dims as u64) as usize
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut frequencies: BTreeMap<String, u32> = BTreeMap::new();
        let mut total = 0u32;
        for term in text
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| t.len() >= 2)
        {
            *frequencies.entry(term.to_lowercase()).or_default() += 1;
            total += 1;
        }

        let mut out = vec![0.0f32; self.dims];
        for (term, tf) in &frequencies {
            let weight = 1.0 + (term.len() as f32).ln();
            out[self.bucket(term)] += *tf as f32 / total as f32 * weight;
        }

        let norm = out.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            out.iter_mut().for_each(|x| *x /= norm);
        }
        out
    }
}

impl Default for TermHashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMS)
    }
}

impl IEmbeddingProvider for TermHashEmbedder {
    fn embed(&self, text: &str) -> RaptorResult<Vec<f32>> {
        Ok(self.vector(text))
    }

    fn embed_batch(&self, texts: &[String]) -> RaptorResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "term-hash"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn text_without_terms_is_the_zero_vector() {
        let v = TermHashEmbedder::new(64).embed("a ? !").unwrap();
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn vectors_have_unit_norm() {
        let v = TermHashEmbedder::default()
            .embed("The wolf blew the straw house down")
            .unwrap();
        assert!((dot(&v, &v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn case_does_not_change_the_vector() {
        let e = TermHashEmbedder::default();
        assert_eq!(e.embed("Glass SLIPPER").unwrap(), e.embed("glass slipper").unwrap());
    }

    #[test]
    fn shared_terms_score_higher() {
        let e = TermHashEmbedder::default();
        let q = e.embed("glass slipper").unwrap();
        let near = e.embed("Cinderella lost her glass slipper").unwrap();
        let far = e.embed("The wolf blew down the straw house").unwrap();
        assert!(dot(&q, &near) > dot(&q, &far));
    }
}
