//! Route handlers

use crate::core::{DownloadRequest, DownloadResult, VideoInfo};
use crate::error::ScrapeError;
use crate::server::docs::docs_page;
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::storage::OutputStore;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Html;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Success envelope
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` with `success: true`
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// HTML documentation page
pub async fn docs(State(state): State<AppState>) -> Html<String> {
    Html(docs_page(&state.public_url))
}

/// Liveness check
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Video Scraper API is running",
    }))
}

/// Every video directory under the output root
pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let entries = with_store(&state, |store| store.list()).await?;
    Ok(Json(json!({
        "success": true,
        "count": entries.len(),
        "data": entries,
    })))
}

/// Scrape a video afresh and return its record
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Envelope<VideoInfo>>> {
    let info = state.scraper.scrape(&video_id).await?;
    Ok(Json(Envelope::new((*info).clone())))
}

/// Cookies captured by the last scrape
pub async fn get_cookies(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Envelope<Value>>> {
    let cookies = with_store(&state, move |store| store.read_cookies(&video_id))
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Cookies not found. Try fetching video info first.").with_hint(
                "Use GET /api/videos/{videoId} to fetch video info including cookies",
            )
        })?;
    Ok(Json(Envelope::new(cookies)))
}

/// Request and response headers captured by the last scrape
pub async fn get_headers(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Envelope<Value>>> {
    let headers = with_store(&state, move |store| store.read_headers(&video_id))
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Headers not found. Try fetching video info first.").with_hint(
                "Use GET /api/videos/{videoId} to fetch video info including headers",
            )
        })?;
    Ok(Json(Envelope::new(headers)))
}

/// Remove a video directory along with any cached record
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.scraper.forget(&video_id).await;
    let id = video_id.clone();
    if !with_store(&state, move |store| store.delete(&id)).await? {
        return Err(ApiError::not_found("Video not found"));
    }

    info!("Deleted video {}", video_id);
    Ok(Json(json!({
        "success": true,
        "message": format!("Video {} deleted successfully", video_id),
    })))
}

/// Runs the download to completion; an empty body selects the defaults
pub async fn download_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Envelope<DownloadResult>>> {
    let request: DownloadRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DownloadRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?
    };

    let id = video_id.clone();
    let result = state
        .scraper
        .download(&video_id, &request, move |progress| {
            debug!("Download {}: {}% ({:?})", id, progress.progress, progress.status);
        })
        .await?;

    Ok(Json(Envelope::new(result)))
}

async fn with_store<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&OutputStore) -> Result<T, ScrapeError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.scraper.store().clone();
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|err| ApiError::internal(format!("task join error: {err}")))?
        .map_err(ApiError::from)
}
