//! Server configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// Server description.
    pub description: Option<String>,
    /// Callback channel policy.
    pub callbacks: CallbackConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: crate::SERVER_NAME.to_string(),
            version: crate::SERVER_VERSION.to_string(),
            description: None,
            callbacks: CallbackConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Policy for suspending callbacks (sampling and elicitation).
///
/// The protocol deliberately leaves timeout values and the elicitation retry
/// bound unspecified; they are caller-configurable here and never hard-coded
/// at call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    /// How long to wait for a sampling reply before treating the client's
    /// LLM as unavailable.
    pub sample_timeout: Duration,
    /// How long to wait for a user's elicitation answer before resolving it
    /// as a cancelled outcome.
    pub elicit_timeout: Duration,
    /// How many times an expired elicitation is re-asked before giving up.
    pub max_elicit_retries: u32,
    /// Interval of the pending-table expiry sweep.
    pub sweep_interval: Duration,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            sample_timeout: Duration::from_secs(30),
            elicit_timeout: Duration::from_secs(60),
            max_elicit_retries: 0,
            sweep_interval: Duration::from_secs(30),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. "info",
    /// "palaver_server=debug").
    pub level: String,
    /// Include target paths in log lines.
    pub with_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_targets: false,
        }
    }
}
