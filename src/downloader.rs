//! Download coordination for Spole.
//!
//! Ties the resolver, cache gate, extractor, and metadata store together:
//! resolve the id, serve repeat requests from the cache, otherwise drive the
//! two-step extraction and record the result.

use crate::config::Settings;
use crate::error::{Result, SpoleError};
use crate::extractor::AudioExtractor;
use crate::store::{MetadataStore, TrackEntry};
use crate::video_id::{UrlResolver, VideoId};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

/// Outcome of a download request.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    pub id: VideoId,
    pub title: String,
    pub cached: bool,
}

/// Coordinates downloads against the shared cache directory.
pub struct Downloader {
    resolver: UrlResolver,
    store: MetadataStore,
    extractor: AudioExtractor,
    downloads_dir: PathBuf,
    /// Per-identifier locks so concurrent requests for the same uncached
    /// video await one extraction instead of racing.
    in_flight: Mutex<HashMap<VideoId, Arc<Mutex<()>>>>,
}

impl Downloader {
    /// Build a downloader from settings, creating the downloads directory.
    pub fn new(settings: &Settings) -> Result<Self> {
        let downloads_dir = settings.downloads_dir();
        std::fs::create_dir_all(&downloads_dir)?;

        Ok(Self {
            resolver: UrlResolver::new(),
            store: MetadataStore::new(settings.metadata_path()),
            extractor: AudioExtractor::new(&settings.extractor),
            downloads_dir,
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Deterministic artifact path for an identifier.
    pub fn artifact_path(&self, id: &VideoId) -> PathBuf {
        self.downloads_dir.join(format!("{}.mp3", id))
    }

    pub fn store(&self) -> &MetadataStore {
        &self.store
    }

    /// Cache gate: a hit requires BOTH the artifact on disk and a metadata
    /// entry in the freshly loaded store. Returns the recorded title on hit.
    pub async fn lookup(&self, id: &VideoId) -> Result<Option<String>> {
        if !self.artifact_path(id).exists() {
            return Ok(None);
        }
        Ok(self.store.load().await?.remove(id).map(|entry| entry.title))
    }

    /// Download the audio for a URL or bare id, serving repeats from the
    /// cache.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn download(&self, input: &str) -> Result<DownloadResult> {
        let id = self.resolver.resolve(input).ok_or_else(|| {
            SpoleError::InvalidInput(format!("Invalid YouTube URL: {input}"))
        })?;

        let slot = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(id.clone()).or_default())
        };
        let guard = slot.lock().await;

        let result = self.fetch_or_extract(&id, input).await;

        drop(guard);
        self.in_flight.lock().await.remove(&id);

        result
    }

    /// The body of a download request, run while holding the per-id lock.
    async fn fetch_or_extract(&self, id: &VideoId, url: &str) -> Result<DownloadResult> {
        if let Some(title) = self.lookup(id).await? {
            info!("Cache hit for {}: {}", id, title);
            return Ok(DownloadResult {
                id: id.clone(),
                title,
                cached: true,
            });
        }

        info!("Download request for {} ({})", url, id);

        // Title probe strictly precedes audio extraction; a probe failure
        // never spawns the second process.
        let title = self.extractor.probe_title(url).await?;
        self.extractor
            .extract_audio(url, &self.artifact_path(id))
            .await?;

        self.store
            .upsert(id, TrackEntry { title: title.clone() })
            .await?;

        info!("Downloaded {}: {}", id, title);
        Ok(DownloadResult {
            id: id.clone(),
            title,
            cached: false,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Write an executable shell script standing in for yt-dlp.
    fn write_stub(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("yt-dlp-stub");
        std::fs::write(&path, body).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn test_settings(dir: &Path, stub: &Path, timeout: u64) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.display().to_string();
        settings.extractor.binary = stub.display().to_string();
        settings.extractor.extra_path = None;
        settings.extractor.timeout_seconds = timeout;
        settings
    }

    /// Stub that records each invocation mode and writes the output file on
    /// the extraction step.
    fn success_stub(dir: &Path, title: &str, extract_delay: &str) -> PathBuf {
        let log = dir.join("calls.log");
        write_stub(
            dir,
            &format!(
                r#"#!/bin/sh
log="{log}"
if [ "$1" = "--get-title" ]; then
  echo probe >> "$log"
  echo "{title}"
  exit 0
fi
sleep {extract_delay}
echo extract >> "$log"
out=""
while [ $# -gt 1 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf 'mp3-bytes' > "$out"
"#,
                log = log.display(),
            ),
        )
    }

    fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_download_then_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let stub = success_stub(dir.path(), "Stub Title", "0");
        let downloader = Downloader::new(&test_settings(dir.path(), &stub, 30)).unwrap();

        let result = downloader
            .download("https://youtube.com/watch?v=abc12345678")
            .await
            .unwrap();

        assert_eq!(result.id.as_str(), "abc12345678");
        assert_eq!(result.title, "Stub Title");
        assert!(!result.cached);
        // Title probe first, then extraction, nothing else.
        assert_eq!(calls(dir.path()), ["probe", "extract"]);
        assert!(downloader.artifact_path(&result.id).exists());

        let entries = downloader.store().load().await.unwrap();
        assert_eq!(entries[&result.id].title, "Stub Title");

        // Repeat request: served from cache, no further tool invocations.
        let repeat = downloader.download("abc12345678").await.unwrap();
        assert!(repeat.cached);
        assert_eq!(repeat.title, "Stub Title");
        assert_eq!(calls(dir.path()), ["probe", "extract"]);
    }

    #[tokio::test]
    async fn test_gate_requires_artifact_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let stub = success_stub(dir.path(), "x", "0");
        let downloader = Downloader::new(&test_settings(dir.path(), &stub, 30)).unwrap();
        let id = VideoId::parse("abc12345678").unwrap();

        // Neither present.
        assert_eq!(downloader.lookup(&id).await.unwrap(), None);

        // Artifact alone is a miss.
        std::fs::write(downloader.artifact_path(&id), b"stale").unwrap();
        assert_eq!(downloader.lookup(&id).await.unwrap(), None);

        // Both present is a hit.
        downloader
            .store()
            .upsert(&id, TrackEntry { title: "T".into() })
            .await
            .unwrap();
        assert_eq!(downloader.lookup(&id).await.unwrap(), Some("T".into()));

        // Metadata alone is a miss.
        std::fs::remove_file(downloader.artifact_path(&id)).unwrap();
        assert_eq!(downloader.lookup(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let stub = success_stub(dir.path(), "x", "0");
        let downloader = Downloader::new(&test_settings(dir.path(), &stub, 30)).unwrap();

        let err = downloader.download("not a url").await.unwrap_err();
        assert!(matches!(err, SpoleError::InvalidInput(_)));
        assert!(calls(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_probe_failure_skips_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.log");
        let stub = write_stub(
            dir.path(),
            &format!(
                r#"#!/bin/sh
if [ "$1" = "--get-title" ]; then
  echo "ERROR: Video unavailable" >&2
  exit 1
fi
echo extract >> "{}"
"#,
                log.display()
            ),
        );
        let downloader = Downloader::new(&test_settings(dir.path(), &stub, 30)).unwrap();

        let err = downloader
            .download("https://youtu.be/abc12345678")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Failed to get video info:"), "{message}");
        assert!(message.contains("Video unavailable"));
        // The audio-extraction step never ran and nothing was recorded.
        assert!(calls(dir.path()).is_empty());
        assert!(downloader.store().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_cleans_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(
            dir.path(),
            r#"#!/bin/sh
if [ "$1" = "--get-title" ]; then
  echo "Doomed Title"
  exit 0
fi
out=""
while [ $# -gt 1 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
printf 'partial' > "$out"
echo "ERROR: network dropped" >&2
exit 1
"#,
        );
        let downloader = Downloader::new(&test_settings(dir.path(), &stub, 30)).unwrap();
        let id = VideoId::parse("abc12345678").unwrap();

        let err = downloader.download("abc12345678").await.unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("yt-dlp failed:"), "{message}");
        assert!(message.contains("network dropped"));
        assert!(!downloader.artifact_path(&id).exists());
        assert!(downloader.store().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probe_timeout_kills_request() {
        let dir = tempfile::tempdir().unwrap();
        let stub = write_stub(
            dir.path(),
            r#"#!/bin/sh
sleep 30
"#,
        );
        let downloader = Downloader::new(&test_settings(dir.path(), &stub, 1)).unwrap();

        let err = downloader.download("abc12345678").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let stub = success_stub(dir.path(), "Shared Title", "0.3");
        let downloader =
            Arc::new(Downloader::new(&test_settings(dir.path(), &stub, 30)).unwrap());

        let a = tokio::spawn({
            let downloader = Arc::clone(&downloader);
            async move { downloader.download("abc12345678").await }
        });
        let b = tokio::spawn({
            let downloader = Arc::clone(&downloader);
            async move { downloader.download("abc12345678").await }
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());

        // Exactly one extraction ran; the other request saw the cache.
        assert_eq!(calls(dir.path()), ["probe", "extract"]);
        assert_eq!([a.cached, b.cached].iter().filter(|c| **c).count(), 1);
        assert_eq!(a.title, "Shared Title");
        assert_eq!(b.title, "Shared Title");
    }
}
