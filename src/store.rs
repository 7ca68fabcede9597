//! Durable id -> title metadata persistence.
//!
//! The whole mapping is stored as a single JSON document next to the audio
//! artifacts. There is no per-key API: callers load the full document, and
//! `upsert` serializes its read-modify-write behind a lock so concurrent
//! writers cannot drop each other's entries.

use crate::error::Result;
use crate::video_id::VideoId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Descriptive metadata recorded for one cached track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEntry {
    pub title: String,
}

/// Whole-document store for the id -> title mapping.
pub struct MetadataStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Read the full mapping. Returns an empty map if no document exists yet.
    pub async fn load(&self) -> Result<HashMap<VideoId, TrackEntry>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the persisted document with the given mapping.
    pub async fn save(&self, entries: &HashMap<VideoId, TrackEntry>) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }

    /// Insert or replace one entry, preserving all others.
    pub async fn upsert(&self, id: &VideoId, entry: TrackEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(id.clone(), entry);
        self.save(&entries).await
    }
}
