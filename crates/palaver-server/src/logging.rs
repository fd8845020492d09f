//! Logging initialization.
//!
//! Logs go to stderr: for stdio-style transports stdout is the protocol
//! channel and must stay pristine. `RUST_LOG` takes precedence over the
//! configured default filter.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.with_targets)
        .compact()
        .try_init();

    if result.is_err() {
        tracing::debug!("logging already initialized, keeping existing subscriber");
    }
}
