//! Tracing setup: structured logging with span definitions and event types.

pub mod events;
pub mod spans;

use std::sync::Once;

use raptor_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted for the log filter.
pub const LOG_ENV_VAR: &str = "RAPTOR_LOG";

static INIT: Once = Once::new();

/// Initialize the tracing subscriber with structured JSON output.
///
/// Respects `RAPTOR_LOG` for filtering, defaulting to `info`. Only the first
/// call in a process installs a subscriber; later calls are no-ops.
pub fn init_tracing() {
    init_from_config(&ObservabilityConfig::default());
}

/// Initialize tracing with a custom filter string (for testing or embedding).
pub fn init_tracing_with_filter(filter: &str) {
    let filter = EnvFilter::new(filter);
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init();
    });
}

/// Initialize from an [`ObservabilityConfig`]. `RAPTOR_LOG` overrides `log_level`.
pub fn init_from_config(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let json = config.json_logs;
    INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        // A subscriber installed elsewhere (e.g. by a host application) wins.
        let _ = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
    });
}
