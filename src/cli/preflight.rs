//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting a session that would otherwise fail midway.

use crate::config::{GeneratorProvider, Settings};
use crate::error::{BlogError, Result};
use crate::openai::is_api_key_configured;
use std::process::Command;

/// Run pre-flight checks for a generation session.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    check_tool(&settings.transcript.yt_dlp)?;
    if settings.generator.provider == GeneratorProvider::OpenAI {
        check_api_key()?;
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(BlogError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}

/// Check if an external tool is available.
pub(crate) fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(BlogError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(BlogError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(BlogError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("ytblog-definitely-missing-tool"),
            Err(BlogError::ToolNotFound(_))
        ));
    }
}
