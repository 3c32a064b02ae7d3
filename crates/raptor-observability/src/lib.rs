//! # raptor-observability
//!
//! Tracing subscriber setup, structured events, span macros, and the
//! caller-owned degradation tracker and query log.

pub mod degradation;
pub mod query_log;
pub mod tracing_setup;

pub use degradation::{DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use query_log::{QueryLog, QueryLogEntry};
pub use tracing_setup::{events, init_from_config, init_tracing, init_tracing_with_filter};
