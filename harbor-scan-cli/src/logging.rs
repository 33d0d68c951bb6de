//! Logging initialization for harbor-scan.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `HarborScanConfig`. Everything is written to stderr.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use harbor_scan_core::config::GeneralConfig;

use crate::error::CliError;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
/// `RUST_LOG` takes precedence over `config.log_level` when set.
///
/// # Formats
///
/// * `"pretty"` - Human-readable colored output (default)
/// * `"json"` - Machine-parseable JSON lines
pub fn init_tracing(config: &GeneralConfig) -> Result<(), CliError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| CliError::Logging(format!("json subscriber: {e}"))),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| CliError::Logging(format!("pretty subscriber: {e}"))),
        other => Err(CliError::Logging(format!(
            "unknown log format '{other}', expected 'json' or 'pretty'"
        ))),
    }
}
