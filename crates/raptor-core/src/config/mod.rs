//! Configuration for every subsystem, loadable from TOML.
//!
//! # Examples
//!
//! ```
//! use raptor_core::config::RaptorConfig;
//!
//! let config = RaptorConfig::from_toml("[retrieval]\ntop_k = 5\n").unwrap();
//! assert_eq!(config.retrieval.top_k, 5);
//! assert_eq!(config.retrieval.over_fetch_factor, 3);
//! ```

pub mod defaults;
mod observability_config;
mod rerank_config;
mod retrieval_config;

use serde::{Deserialize, Serialize};

pub use observability_config::ObservabilityConfig;
pub use rerank_config::RerankConfig;
pub use retrieval_config::{RetrievalConfig, SelectionMode, TraversalMode};

use crate::errors::{RaptorError, RaptorResult};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RaptorConfig {
    pub retrieval: RetrievalConfig,
    pub rerank: RerankConfig,
    pub observability: ObservabilityConfig,
}

impl RaptorConfig {
    /// Parse from a TOML string. Missing sections and keys take defaults.
    /// The retrieval section is validated before returning.
    pub fn from_toml(input: &str) -> RaptorResult<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| RaptorError::ConfigError(e.to_string()))?;
        config.retrieval.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> RaptorResult<String> {
        toml::to_string(self).map_err(|e| RaptorError::ConfigError(e.to_string()))
    }
}
