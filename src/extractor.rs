//! Audio extraction via yt-dlp.
//!
//! This module wraps the two external invocations a download needs: a title
//! probe, then the audio extraction itself. Both run as child processes with
//! captured stderr and a hard timeout.

use crate::config::{ExtractorSettings, Settings};
use crate::error::{Result, SpoleError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Runs the external extraction tool.
pub struct AudioExtractor {
    binary: String,
    /// PATH for child processes, with the configured tool dir prepended.
    /// Computed once at construction.
    child_path: Option<String>,
    timeout: Duration,
}

impl AudioExtractor {
    pub fn new(settings: &ExtractorSettings) -> Self {
        let child_path = settings.extra_path.as_ref().map(|extra| {
            let extra = Settings::expand_path(extra);
            match std::env::var("PATH") {
                Ok(path) => format!("{}:{}", extra.display(), path),
                Err(_) => extra.display().to_string(),
            }
        });

        Self {
            binary: settings.binary.clone(),
            child_path,
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }

    /// Fetch the video title. Trimmed stdout is the title; stderr is the
    /// diagnostic on failure.
    #[instrument(skip(self))]
    pub async fn probe_title(&self, url: &str) -> Result<String> {
        debug!("Probing title");

        let output = self.run(&["--get-title", url]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let detail = if stderr.is_empty() { "Unknown error" } else { stderr };
            return Err(SpoleError::Extraction(format!(
                "Failed to get video info: {detail}"
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Extract audio to `output_path` as MP3. On failure any partial output
    /// file is removed, so a later cache check never sees a broken artifact.
    #[instrument(skip(self, output_path))]
    pub async fn extract_audio(&self, url: &str, output_path: &Path) -> Result<()> {
        info!("Extracting audio to {}", output_path.display());

        let path_arg = output_path.to_str().ok_or_else(|| {
            SpoleError::Config(format!("Non-UTF8 output path: {}", output_path.display()))
        })?;

        let result = self
            .run(&["-x", "--audio-format", "mp3", "-o", path_arg, url])
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) => {
                remove_partial(output_path);
                return Err(e);
            }
        };

        if !output.status.success() {
            remove_partial(output_path);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpoleError::Extraction(format!(
                "yt-dlp failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }

    /// Spawn the tool and wait for it, enforcing the timeout. The child is
    /// killed if the timeout fires.
    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(path) = &self.child_path {
            command.env("PATH", path);
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SpoleError::ToolNotFound(self.binary.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => Ok(output?),
            Err(_) => Err(SpoleError::Extraction(format!(
                "yt-dlp timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

fn remove_partial(path: &Path) {
    if path.exists() {
        warn!("Removing partial output file {}", path.display());
        let _ = std::fs::remove_file(path);
    }
}
