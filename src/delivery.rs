//! Byte-serving of cached audio artifacts.
//!
//! Streams a previously extracted MP3 to the client without buffering the
//! whole file, honoring `Range` requests so browser players can seek.

use crate::error::{Result, SpoleError};
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const AUDIO_MIME: &str = "audio/mpeg";

/// Stream an artifact file, honoring a `Range` header if present.
///
/// Does not consult the metadata store: an artifact on disk is servable
/// whether or not a title was ever recorded for it.
pub async fn stream_artifact(path: &Path, headers: &HeaderMap) -> Result<Response> {
    let mut file = File::open(path).await.map_err(|_| {
        SpoleError::ArtifactNotFound(path.display().to_string())
    })?;
    let size = file.metadata().await?.len();

    let range = headers
        .get(header::RANGE)
        .and_then(|value| parse_range_header(value, size));

    let mut response = if let Some((start, end)) = range {
        if start >= size {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::RANGE_NOT_SATISFIABLE;
            response.headers_mut().insert(
                header::CONTENT_RANGE,
                format!("bytes */{}", size).parse().unwrap(),
            );
            response
        } else {
            let end = end.min(size.saturating_sub(1));
            let length = end - start + 1;
            file.seek(SeekFrom::Start(start)).await?;
            let body = Body::from_stream(ReaderStream::new(file.take(length)));
            let mut response = body.into_response();
            *response.status_mut() = StatusCode::PARTIAL_CONTENT;
            response.headers_mut().insert(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, size).parse().unwrap(),
            );
            response
                .headers_mut()
                .insert(header::CONTENT_LENGTH, length.into());
            response
        }
    } else {
        let body = Body::from_stream(ReaderStream::new(file));
        let mut response = body.into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, size.into());
        response
    };

    response
        .headers_mut()
        .insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(AUDIO_MIME));

    Ok(response)
}

/// Parse a `Range: bytes=...` header against the file size. Returns the
/// inclusive (start, end) byte offsets, or None for anything unusable.
fn parse_range_header(value: &HeaderValue, size: u64) -> Option<(u64, u64)> {
    let value = value.to_str().ok()?.trim();
    let (unit, range) = value.split_once('=')?;
    if unit.trim() != "bytes" {
        return None;
    }

    let (start_str, end_str) = range.trim().split_once('-')?;

    if start_str.is_empty() {
        // Suffix range: "-N" means the last N bytes.
        let suffix_len: u64 = end_str.parse().ok()?;
        if suffix_len == 0 {
            return None;
        }
        let start = size.saturating_sub(suffix_len);
        return Some((start, size.saturating_sub(1)));
    }

    let start: u64 = start_str.parse().ok()?;
    let end: u64 = if end_str.is_empty() {
        size.saturating_sub(1)
    } else {
        end_str.parse().ok()?
    };

    if end < start {
        return None;
    }
    Some((start, end))
}
