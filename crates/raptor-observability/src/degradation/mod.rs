mod tracker;

pub use tracker::{DegradationTracker, RecoveryStatus, TrackedDegradation};
