//! harbor-scan -- trigger a Harbor vulnerability scan and gate on the worst severity.
//!
//! Configuration precedence: command-line flags > `HARBOR_SCAN_*` env vars >
//! `--config` file > defaults. Every failure, including a policy violation,
//! exits with status 1.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use harbor_scan_core::config::HarborScanConfig;
use harbor_scan_core::error::HarborScanError;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    let args = match cli.command {
        Commands::Version => return commands::version::execute(&writer),
        Commands::Scan(args) => args,
    };

    let mut config = match &cli.config {
        Some(path) => HarborScanConfig::load(path).await?,
        None => HarborScanConfig::from_env()?,
    };
    if let Some(level) = cli.log_level {
        config.general.log_level = level;
    }
    commands::scan::apply_overrides(&args, &mut config);

    // all layers are merged here; a missing credential is reported before any bad value
    config
        .registry
        .require_credentials()
        .map_err(HarborScanError::from)?;
    config.validate()?;

    logging::init_tracing(&config.general)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    commands::scan::execute(&args, &config, &writer, cancel).await
}

/// Cancel the run on Ctrl-C.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling scan");
            cancel.cancel();
        }
    });
}
