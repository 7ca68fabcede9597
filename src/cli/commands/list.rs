//! List command - show cached tracks.

use crate::cli::Output;
use crate::config::Settings;
use crate::downloader::Downloader;

pub async fn run_list(settings: Settings) -> anyhow::Result<()> {
    let downloader = Downloader::new(&settings)?;
    let entries = downloader.store().load().await?;

    if entries.is_empty() {
        Output::info("No cached tracks yet. Use 'spole fetch <url>' to add one.");
        return Ok(());
    }

    Output::header("Cached Tracks");
    println!();

    let mut entries: Vec<_> = entries.into_iter().collect();
    entries.sort_by(|a, b| a.1.title.cmp(&b.1.title));

    for (id, entry) in &entries {
        let size = std::fs::metadata(downloader.artifact_path(id))
            .ok()
            .map(|m| m.len());
        Output::track(&entry.title, id.as_str(), size);
    }

    println!();
    Output::info(&format!("{} track(s) cached.", entries.len()));

    Ok(())
}
