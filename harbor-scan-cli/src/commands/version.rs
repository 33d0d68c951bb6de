//! `harbor-scan version` command handler

use std::io::Write;

use serde::Serialize;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const UNKNOWN: &str = "unknown";

/// Version and build metadata.
///
/// Build time and revision are injected at compile time through
/// `HARBOR_SCAN_BUILD_TIME` and `HARBOR_SCAN_BUILD_REVISION`.
#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: &'static str,
    pub build_time: &'static str,
    pub build_revision: &'static str,
}

impl VersionInfo {
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_time: option_env!("HARBOR_SCAN_BUILD_TIME").unwrap_or(UNKNOWN),
            build_revision: option_env!("HARBOR_SCAN_BUILD_REVISION").unwrap_or(UNKNOWN),
        }
    }
}

impl Render for VersionInfo {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Version: {}", self.version)?;
        writeln!(w, "Build time: {}", self.build_time)?;
        writeln!(w, "Build revision: {}", self.build_revision)?;
        Ok(())
    }
}

/// Execute the `version` command.
pub fn execute(writer: &OutputWriter) -> Result<(), CliError> {
    writer.render(&VersionInfo::current())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_package() {
        let info = VersionInfo::current();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert!(!info.build_time.is_empty());
        assert!(!info.build_revision.is_empty());
    }

    #[test]
    fn test_version_text_lines() {
        let info = VersionInfo {
            version: "1.2.3",
            build_time: "2024-03-01T10:00:00Z",
            build_revision: UNKNOWN,
        };
        let mut buffer = Vec::new();
        info.render_text(&mut buffer).expect("render should succeed");
        assert_eq!(
            String::from_utf8(buffer).expect("valid UTF-8"),
            "Version: 1.2.3\nBuild time: 2024-03-01T10:00:00Z\nBuild revision: unknown\n"
        );
    }
}
