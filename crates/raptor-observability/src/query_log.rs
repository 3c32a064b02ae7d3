//! Per-query performance log: query text, traversal mode, rerank decision,
//! latency, result count, and tokens used.

use std::time::Duration;

use raptor_core::config::TraversalMode;
use raptor_core::models::{RerankDecision, RetrievalOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query: String,
    pub mode: TraversalMode,
    pub decision: RerankDecision,
    pub latency: Duration,
    pub candidates_recalled: usize,
    pub result_count: usize,
    pub token_budget: usize,
    pub tokens_used: usize,
    pub timestamp_epoch_ms: i64,
}

impl QueryLogEntry {
    pub fn from_outcome(
        query: impl Into<String>,
        mode: TraversalMode,
        token_budget: usize,
        outcome: &RetrievalOutcome,
    ) -> Self {
        Self {
            query: query.into(),
            mode,
            decision: outcome.decision,
            latency: outcome.latency,
            candidates_recalled: outcome.candidates_recalled,
            result_count: outcome.passages.len(),
            token_budget,
            tokens_used: outcome.passages.total_tokens(),
            timestamp_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Append-only query log with ring-buffer retention.
#[derive(Debug, Clone)]
pub struct QueryLog {
    entries: Vec<QueryLogEntry>,
    max_entries: usize,
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryLog {
    pub fn new() -> Self {
        Self::with_capacity(50_000)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn record(&mut self, entry: QueryLogEntry) {
        tracing::debug!(
            event = "query_logged",
            query = %entry.query,
            mode = ?entry.mode,
            decision = ?entry.decision,
            latency_ms = entry.latency.as_millis() as u64,
            result_count = entry.result_count,
            tokens_used = entry.tokens_used,
            "query logged"
        );

        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            self.entries.drain(..self.entries.len() - self.max_entries);
        }
    }

    pub fn entries(&self) -> &[QueryLogEntry] {
        &self.entries
    }

    pub fn avg_latency(&self) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.entries.iter().map(|e| e.latency).sum();
        total / self.entries.len() as u32
    }

    /// Latency at the given percentile (0.0 to 1.0).
    pub fn latency_percentile(&self, p: f64) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let mut latencies: Vec<Duration> = self.entries.iter().map(|e| e.latency).collect();
        latencies.sort();
        let idx = ((p * (latencies.len() - 1) as f64).round() as usize).min(latencies.len() - 1);
        latencies[idx]
    }

    /// Share of logged queries whose order came from the rerank model.
    pub fn rerank_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let reranked = self
            .entries
            .iter()
            .filter(|e| e.decision == RerankDecision::Reranked)
            .count();
        reranked as f64 / self.entries.len() as f64
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}
