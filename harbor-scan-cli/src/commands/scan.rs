//! `harbor-scan scan` command handler

use std::io::Write;
use std::time::Duration;

use colored::{ColoredString, Colorize};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use harbor_scan_core::config::HarborScanConfig;
use harbor_scan_core::error::HarborScanError;
use harbor_scan_core::types::Severity;
use harbor_scan_scanner::{
    HttpRegistryClient, RegistryEndpoint, RunOutcome, ScanRunner, ScanSummary, SeverityGate,
};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const RULE: &str = "+===============================================+";

/// Merge `scan` flags into the loaded configuration. Flags win.
pub fn apply_overrides(args: &ScanArgs, config: &mut HarborScanConfig) {
    if let Some(username) = &args.username {
        config.registry.username = username.clone();
    }
    if let Some(password) = &args.password {
        config.registry.password = password.clone();
    }
    if let Some(url) = &args.url {
        config.registry.url = url.clone();
    }
    if let Some(severity) = &args.severity {
        config.scan.severity = severity.clone();
    }
}

/// Execute the `scan` command.
///
/// A policy violation is rendered first and then returned as
/// [`CliError::PolicyViolation`].
pub async fn execute(
    args: &ScanArgs,
    config: &HarborScanConfig,
    writer: &OutputWriter,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let registry = &config.registry;
    registry
        .require_credentials()
        .map_err(HarborScanError::from)?;
    let threshold = config.scan.threshold()?;

    let endpoint = RegistryEndpoint::parse(&registry.url)?;
    let client = HttpRegistryClient::new(
        endpoint.clone(),
        &registry.username,
        &registry.password,
        Duration::from_secs(registry.timeout_secs),
    )?;

    let runner = ScanRunner::builder(client, endpoint)
        .gate(SeverityGate::new(threshold))
        .poll_interval(Duration::from_secs(config.scan.poll_interval_secs))
        .cancellation(cancel)
        .build();

    info!(
        image = %args.image,
        registry = %runner.endpoint().origin(),
        threshold = %threshold,
        "scanning image"
    );

    let outcome = runner.run(&args.image).await?;
    writer.render(&ScanResultView::from(&outcome))?;

    match outcome {
        RunOutcome::Completed(summary) if summary.is_violation() => {
            Err(CliError::PolicyViolation {
                reported: summary.severity,
                threshold: summary.threshold,
            })
        }
        _ => Ok(()),
    }
}

/// Output payload for one scan run.
#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanResultView<'a> {
    Completed(&'a ScanSummary),
    Failed {
        image: String,
        report_id: &'a str,
    },
    Unrecognized {
        image: String,
        content_types: &'a [String],
    },
}

impl<'a> From<&'a RunOutcome> for ScanResultView<'a> {
    fn from(outcome: &'a RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed(summary) => Self::Completed(summary),
            RunOutcome::Failed { image, report_id } => Self::Failed {
                image: image.to_string(),
                report_id,
            },
            RunOutcome::Unrecognized {
                image,
                content_types,
            } => Self::Unrecognized {
                image: image.to_string(),
                content_types,
            },
        }
    }
}

impl Render for ScanResultView<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        // failed and unrecognized runs are only reported through the log
        match self {
            Self::Completed(summary) => render_summary(summary, w),
            Self::Failed { .. } | Self::Unrecognized { .. } => Ok(()),
        }
    }
}

fn render_summary(summary: &ScanSummary, w: &mut dyn Write) -> std::io::Result<()> {
    let counts = &summary.counts;

    writeln!(w, "{RULE}")?;
    writeln!(w, "|                  Scan report                  |")?;
    writeln!(w, "{RULE}")?;
    writeln!(w, "| Image: {}", summary.image.bold())?;
    writeln!(w, "| Artifact url: {}", summary.artifact_url)?;
    writeln!(w, "|")?;
    writeln!(
        w,
        "| Vulnerability Severity: {}",
        paint(summary.severity, summary.severity.as_str())
    )?;
    writeln!(
        w,
        "| Total: {} (UNKNOWN: {}, LOW: {}, MEDIUM: {}, HIGH: {}, CRITICAL: {})",
        summary.total,
        counts.unknown + counts.none,
        counts.low,
        counts.medium,
        counts.high,
        counts.critical
    )?;
    writeln!(w, "| *Fixable: {}", summary.fixable)?;
    writeln!(w, "|")?;
    if summary.scanner.vendor.is_empty() {
        writeln!(w, "| Scanned by: {}", summary.scanner)?;
    } else {
        writeln!(
            w,
            "| Scanned by: {} ({})",
            summary.scanner, summary.scanner.vendor
        )?;
    }
    writeln!(w, "| Duration: {}", format_duration(summary.duration_secs))?;

    if summary.is_violation() {
        let detail = format!(
            "Severity: {}, Max severity: {}",
            summary.severity, summary.threshold
        );
        writeln!(w, "{RULE}")?;
        writeln!(
            w,
            "| {} |",
            format!("{:<45}", "/!\\ The max severity level is reached !")
                .red()
                .bold()
        )?;
        writeln!(w, "| {} |", format!("{detail:<45}").red())?;
        writeln!(w, "{RULE}")?;
    }

    Ok(())
}

fn paint(severity: Severity, text: &str) -> ColoredString {
    match severity {
        Severity::Critical => text.red().bold(),
        Severity::High => text.red(),
        Severity::Medium => text.yellow(),
        Severity::Low => text.normal(),
        Severity::None => text.green(),
    }
}

/// Compact `1h2m3s` form; zero components below the largest unit are kept.
fn format_duration(secs: i64) -> String {
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.unsigned_abs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}
