use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use raptor_core::errors::{RaptorError, RaptorResult};
use raptor_core::traits::IRerankModel;

/// Scores a passage by the integer at the end of its text.
///
/// Against [`ScriptedTree::descending_leaves`](crate::ScriptedTree::descending_leaves),
/// where leaf `i` is `"leaf {i}"` and recall score falls with `i`, this exactly
/// reverses the recall order.
pub struct ReverseRecallModel;

impl IRerankModel for ReverseRecallModel {
    fn name(&self) -> &str {
        "reverse-recall"
    }

    fn score(&self, _query: &str, passage: &str) -> RaptorResult<f64> {
        let digits: String = passage
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Ok(digits.parse::<f64>().unwrap_or(0.0))
    }
}

/// Always faults.
pub struct FailingModel;

impl IRerankModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn score(&self, _query: &str, _passage: &str) -> RaptorResult<f64> {
        Err(RaptorError::TaskFailed {
            reason: "model process crashed".into(),
        })
    }
}

/// Blocks for `delay` per batch, then scores every passage 1.0.
pub struct SlowModel {
    pub delay: Duration,
}

impl SlowModel {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl IRerankModel for SlowModel {
    fn name(&self) -> &str {
        "slow"
    }

    fn score(&self, _query: &str, _passage: &str) -> RaptorResult<f64> {
        std::thread::sleep(self.delay);
        Ok(1.0)
    }

    fn score_batch(&self, _query: &str, passages: &[String]) -> RaptorResult<Vec<f64>> {
        std::thread::sleep(self.delay);
        Ok(vec![1.0; passages.len()])
    }
}

/// Delegates to an inner model and counts what reaches it.
pub struct CountingModel {
    inner: Arc<dyn IRerankModel>,
    batches: AtomicUsize,
    passages: AtomicUsize,
    max_batch: AtomicUsize,
}

impl CountingModel {
    pub fn new(inner: Arc<dyn IRerankModel>) -> Self {
        Self {
            inner,
            batches: AtomicUsize::new(0),
            passages: AtomicUsize::new(0),
            max_batch: AtomicUsize::new(0),
        }
    }

    /// Number of `score_batch` invocations.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Total passages scored across all invocations.
    pub fn passages(&self) -> usize {
        self.passages.load(Ordering::SeqCst)
    }

    /// Largest single batch seen.
    pub fn max_batch(&self) -> usize {
        self.max_batch.load(Ordering::SeqCst)
    }
}

impl IRerankModel for CountingModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn score(&self, query: &str, passage: &str) -> RaptorResult<f64> {
        self.score_batch(query, &[passage.to_string()])
            .map(|scores| scores.first().copied().unwrap_or(0.0))
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn score_batch(&self, query: &str, passages: &[String]) -> RaptorResult<Vec<f64>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.passages.fetch_add(passages.len(), Ordering::SeqCst);
        self.max_batch.fetch_max(passages.len(), Ordering::SeqCst);
        self.inner.score_batch(query, passages)
    }
}
