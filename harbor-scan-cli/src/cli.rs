//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// harbor-scan -- scan an image stored in Harbor and fail on a severity threshold.
///
/// Use `harbor-scan <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "harbor-scan", version, about, long_about = None)]
pub struct Cli {
    /// Optional harbor-scan.toml configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan an image and compare its worst severity to the threshold.
    Scan(ScanArgs),

    /// Print version and build information.
    Version,
}

// ---- scan ----

/// Trigger a scan, wait for it to finish and apply the severity gate.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Registry username (robot account).
    #[arg(long)]
    pub username: Option<String>,

    /// Registry password.
    #[arg(long)]
    pub password: Option<String>,

    /// Registry base URL (https:// is assumed when no scheme is given).
    #[arg(long)]
    pub url: Option<String>,

    /// Lowest severity that fails the run (None, Low, Medium, High, Critical).
    #[arg(long)]
    pub severity: Option<String>,

    /// Image to scan: [registry/]project/repository[:tag][@sha256:digest]
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_scan_with_all_flags() {
        let cli = Cli::try_parse_from([
            "harbor-scan",
            "scan",
            "--username",
            "robot$ci",
            "--password",
            "s3cret",
            "--url",
            "harbor.example.com",
            "--severity",
            "High",
            "library/nginx:1.25.3",
        ])
        .expect("parse succeeded");

        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.username.as_deref(), Some("robot$ci"));
                assert_eq!(args.password.as_deref(), Some("s3cret"));
                assert_eq!(args.url.as_deref(), Some("harbor.example.com"));
                assert_eq!(args.severity.as_deref(), Some("High"));
                assert_eq!(args.image, "library/nginx:1.25.3");
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_flags_are_optional() {
        let cli = Cli::try_parse_from(["harbor-scan", "scan", "library/nginx"])
            .expect("parse succeeded");
        match cli.command {
            Commands::Scan(args) => {
                assert!(args.username.is_none());
                assert!(args.password.is_none());
                assert!(args.url.is_none());
                assert!(args.severity.is_none(), "severity default comes from config");
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn test_cli_parse_scan_requires_image() {
        let result = Cli::try_parse_from(["harbor-scan", "scan", "--username", "u"]);
        assert!(result.is_err(), "image argument is required");
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::try_parse_from(["harbor-scan", "version"]).expect("parse succeeded");
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "harbor-scan",
            "scan",
            "library/nginx",
            "--output",
            "json",
            "--log-level",
            "debug",
            "-c",
            "/etc/harbor-scan.toml",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/harbor-scan.toml")));
    }

    #[test]
    fn test_cli_default_output_is_text() {
        let cli = Cli::try_parse_from(["harbor-scan", "version"]).expect("parse succeeded");
        assert_eq!(cli.output, OutputFormat::Text);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_rejects_unknown_output_format() {
        let result = Cli::try_parse_from(["harbor-scan", "--output", "yaml", "version"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_severity_help_describes_failing_threshold() {
        let command = Cli::command();
        let scan = command
            .find_subcommand("scan")
            .expect("scan subcommand exists");
        let severity = scan
            .get_arguments()
            .find(|arg| arg.get_id() == "severity")
            .expect("severity flag exists");
        let help = severity.get_help().expect("severity has help").to_string();
        assert!(help.starts_with("Lowest severity that fails the run"), "{help}");
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
