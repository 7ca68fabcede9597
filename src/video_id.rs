//! Video identifier resolution.
//!
//! Turns the heterogeneous URL forms a user may paste (watch URLs, short
//! links, embeds) or a bare identifier string into the canonical 11-character
//! video id that names a cached artifact.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical 11-character video identifier.
///
/// Always exactly 11 characters of `[A-Za-z0-9_-]`, so it is safe to use
/// verbatim as a filename stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Parse a bare identifier: exactly 11 allowed characters, nothing else.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.len() == 11
            && input
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            Some(Self(input.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves video identifiers from URLs or bare id strings.
pub struct UrlResolver {
    url_patterns: Vec<Regex>,
}

impl UrlResolver {
    pub fn new() -> Self {
        // URL shapes are tried in order before the bare-id form, so a string
        // that is both a valid URL and embeds an id resolves via the URL.
        let url_patterns = [
            r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})",
            r"(?:https?://)?(?:www\.)?youtu\.be/([a-zA-Z0-9_-]{11})",
            r"(?:https?://)?(?:www\.)?youtube\.com/embed/([a-zA-Z0-9_-]{11})",
            r"(?:https?://)?(?:www\.)?youtube\.com/v/([a-zA-Z0-9_-]{11})",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("Invalid regex"))
        .collect();

        Self { url_patterns }
    }

    /// Extract the video id from a URL or bare id. Pure string matching; no
    /// network access.
    pub fn resolve(&self, input: &str) -> Option<VideoId> {
        let input = input.trim();

        for pattern in &self.url_patterns {
            if let Some(caps) = pattern.captures(input) {
                return caps.get(1).map(|m| VideoId(m.as_str().to_string()));
            }
        }

        VideoId::parse(input)
    }
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_forms() {
        let resolver = UrlResolver::new();

        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ] {
            assert_eq!(
                resolver.resolve(input).map(|id| id.to_string()),
                Some("dQw4w9WgXcQ".to_string()),
                "failed for {input}"
            );
        }
    }

    #[test]
    fn test_resolve_rejects_invalid() {
        let resolver = UrlResolver::new();

        assert_eq!(resolver.resolve("short-id"), None);
        assert_eq!(resolver.resolve("twelve-chars"), None);
        assert_eq!(resolver.resolve("has.bad.chr"), None);
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_resolve_url_with_extra_params() {
        let resolver = UrlResolver::new();

        assert_eq!(
            resolver
                .resolve("https://youtu.be/abc12345678?t=42")
                .map(|id| id.to_string()),
            Some("abc12345678".to_string())
        );
    }

    #[test]
    fn test_parse_bare() {
        assert!(VideoId::parse("abc12345678").is_some());
        assert!(VideoId::parse("abc1234567").is_none());
        assert!(VideoId::parse("../../../et").is_none());
        assert!(VideoId::parse("abc1234567/").is_none());
    }
}
