//! Pre-flight checks before starting work.
//!
//! Validates that the extraction tool is available before accepting
//! downloads that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SpoleError};
use std::process::Command;

/// Verify the configured extraction tool runs at all.
pub fn check(settings: &Settings) -> Result<()> {
    check_tool(&settings.extractor.binary)
}

fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SpoleError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SpoleError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SpoleError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
