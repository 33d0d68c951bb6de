//! CLI-specific error types

use harbor_scan_core::error::HarborScanError;
use harbor_scan_core::types::Severity;
use harbor_scan_scanner::ScannerError;

/// CLI-specific error type.
///
/// Every variant ends the process with exit code 1; `main` prints the message.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration, credential or severity argument problem.
    #[error("{0}")]
    Core(#[from] HarborScanError),

    /// Scan request, polling or report evaluation failed.
    #[error("{0}")]
    Scan(#[from] ScannerError),

    /// The reported severity reaches the threshold.
    #[error("max severity level reached: severity {reported}, max severity {threshold}")]
    PolicyViolation {
        reported: Severity,
        threshold: Severity,
    },

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
