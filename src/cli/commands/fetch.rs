//! Fetch command - download one video's audio into the cache.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::downloader::Downloader;

pub async fn run_fetch(url: &str, settings: Settings) -> anyhow::Result<()> {
    preflight::check(&settings)?;

    let downloader = Downloader::new(&settings)?;
    let result = downloader.download(url).await?;

    if result.cached {
        Output::success(&format!("Already cached: {}", result.title));
    } else {
        Output::success(&format!("Downloaded: {}", result.title));
    }
    Output::kv("Id", result.id.as_str());
    Output::kv(
        "File",
        &downloader.artifact_path(&result.id).display().to_string(),
    );

    Ok(())
}
