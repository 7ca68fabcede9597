//! Error types for Spole.

use thiserror::Error;

/// Library-level error type for Spole operations.
#[derive(Error, Debug)]
pub enum SpoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    // Displays the diagnostic verbatim; this string is what API clients see.
    #[error("{0}")]
    Extraction(String),

    #[error("Audio file not found: {0}")]
    ArtifactNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Spole operations.
pub type Result<T> = std::result::Result<T, SpoleError>;
