//! Configuration module for Spole.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{ExtractorSettings, GeneralSettings, ServerSettings, Settings};
