//! HTTP API server.
//!
//! Exposes the download and audio-fetch operations consumed by the browser
//! player: submit a URL, get back `{id, title, cached}`, then stream the
//! audio by id.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::delivery;
use crate::downloader::Downloader;
use crate::error::SpoleError;
use crate::video_id::VideoId;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    downloader: Downloader,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<&str>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or(&settings.server.host).to_string();
    let port = port.unwrap_or(settings.server.port);

    // Cached audio is still servable without the tool, so this only warns.
    if let Err(e) = preflight::check(&settings) {
        Output::warning(&format!("{}. Downloads will fail until it is installed.", e));
    }

    let downloader = Downloader::new(&settings)?;
    let state = Arc::new(AppState { downloader });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/download", post(download))
        .route("/api/audio/{id}", get(audio))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Spole Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Download", "POST /api/download");
    Output::kv("Audio", "GET  /api/audio/:id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct DownloadRequest {
    url: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn download(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DownloadRequest>,
) -> impl IntoResponse {
    let url = match req.url {
        Some(url) if !url.trim().is_empty() => url,
        _ => return error_response(StatusCode::BAD_REQUEST, "URL is required"),
    };

    match state.downloader.download(&url).await {
        Ok(result) => Json(result).into_response(),
        Err(SpoleError::InvalidInput(_)) => {
            error_response(StatusCode::BAD_REQUEST, "Invalid YouTube URL")
        }
        Err(e) => {
            error!("Download error: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                friendly_error(&e.to_string()),
            )
        }
    }
}

async fn audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // Only a well-formed id can name an artifact; anything else is a miss.
    let Some(id) = VideoId::parse(&id) else {
        return error_response(StatusCode::NOT_FOUND, "Audio file not found");
    };

    match delivery::stream_artifact(&state.downloader.artifact_path(&id), &headers).await {
        Ok(response) => response,
        Err(SpoleError::ArtifactNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, "Audio file not found")
        }
        Err(e) => {
            error!("Audio delivery error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Remap known yt-dlp failure text to friendlier wording; everything else
/// surfaces the raw diagnostic.
fn friendly_error(message: &str) -> String {
    if message.contains("Sign in to confirm") {
        "This video is blocked by YouTube bot detection. Try a different video.".to_string()
    } else if message.contains("Video unavailable") {
        "Video unavailable or private.".to_string()
    } else {
        message.to_string()
    }
}
