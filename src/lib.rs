//! Spole - YouTube Audio Cache
//!
//! A self-hosted server that turns YouTube videos into cached, playable audio.
//!
//! The name "Spole" comes from the Norwegian word for "spool/reel."
//!
//! # Overview
//!
//! Spole lets you:
//! - Submit a YouTube URL and get back playable MP3 audio
//! - Serve repeat requests from a local cache instead of re-downloading
//! - Stream cached audio with byte-range support for seeking
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `video_id` - Video identifier resolution from URLs
//! - `store` - Durable id -> title metadata persistence
//! - `extractor` - yt-dlp subprocess orchestration
//! - `downloader` - Cache gate and download coordination
//! - `delivery` - Byte-serving of cached artifacts
//!
//! # Example
//!
//! ```rust,no_run
//! use spole::config::Settings;
//! use spole::downloader::Downloader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let downloader = Downloader::new(&settings)?;
//!
//!     let result = downloader.download("dQw4w9WgXcQ").await?;
//!     println!("{} (cached: {})", result.title, result.cached);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod delivery;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod store;
pub mod video_id;

pub use error::{Result, SpoleError};
