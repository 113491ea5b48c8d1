//! Download operation handlers.

use crate::api::AppState;
use crate::api::error_response::{error_response, from_error};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

/// Request body for POST /knobs/batch-download
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchDownloadRequest {
    /// Ids of the knobs to download
    pub knob_ids: Vec<u64>,
}

/// POST /knobs/:id/download - Download one knob synchronously
#[utoipa::path(
    post,
    path = "/knobs/{id}/download",
    tag = "downloads",
    params(("id" = u64, Path, description = "Knob id")),
    responses(
        (status = 200, description = "Knob downloaded"),
        (status = 404, description = "Unknown knob id"),
        (status = 409, description = "Another run is in progress"),
        (status = 502, description = "Download failed after retries")
    )
)]
pub async fn download_knob(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.downloader.download_one(id).await {
        Ok(report) if report.completed > 0 => (
            StatusCode::OK,
            Json(json!({"message": format!("Successfully downloaded knob {id}")})),
        )
            .into_response(),
        Ok(_) => error_response(
            StatusCode::BAD_GATEWAY,
            "download_failed",
            format!("failed to download knob {id}"),
        ),
        Err(e) => from_error(&e),
    }
}

/// POST /knobs/batch-download - Download a set of knobs in the background
#[utoipa::path(
    post,
    path = "/knobs/batch-download",
    tag = "downloads",
    request_body = BatchDownloadRequest,
    responses(
        (status = 202, description = "Batch download started"),
        (status = 400, description = "Empty id list"),
        (status = 409, description = "Another run is in progress")
    )
)]
pub async fn batch_download(
    State(state): State<AppState>,
    Json(request): Json<BatchDownloadRequest>,
) -> Response {
    if request.knob_ids.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty_request", "no knob ids provided");
    }
    if state.downloader.is_running() {
        return error_response(
            StatusCode::CONFLICT,
            "operation_in_progress",
            "a scrape or download run is already in progress",
        );
    }

    let downloader = state.downloader.clone();
    let ids = request.knob_ids.clone();
    tokio::spawn(async move {
        match downloader.download_many(&ids).await {
            Ok(report) => {
                tracing::info!(
                    completed = report.completed,
                    failed = report.failed,
                    "Background batch download finished"
                );
            }
            Err(e) => tracing::error!(error = %e, "Background batch download failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "message": format!("Started downloading {} knobs", request.knob_ids.len()),
            "knob_ids": request.knob_ids,
        })),
    )
        .into_response()
}

/// POST /thumbnails/download - Fetch all thumbnails in the background
#[utoipa::path(
    post,
    path = "/thumbnails/download",
    tag = "downloads",
    responses(
        (status = 202, description = "Thumbnail download started"),
        (status = 409, description = "Another run is in progress")
    )
)]
pub async fn download_thumbnails(State(state): State<AppState>) -> Response {
    if state.downloader.is_running() {
        return error_response(
            StatusCode::CONFLICT,
            "operation_in_progress",
            "a scrape or download run is already in progress",
        );
    }

    let downloader = state.downloader.clone();
    tokio::spawn(async move {
        match downloader.download_thumbnails().await {
            Ok(report) => {
                tracing::info!(
                    completed = report.completed,
                    failed = report.failed,
                    "Background thumbnail download finished"
                );
            }
            Err(e) => tracing::error!(error = %e, "Background thumbnail download failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({"message": "Started downloading thumbnails"})),
    )
        .into_response()
}

/// GET /downloads/status - Progress of the current or last download run
#[utoipa::path(
    get,
    path = "/downloads/status",
    tag = "downloads",
    responses(
        (status = 200, description = "Progress snapshot", body = crate::types::ProgressSnapshot)
    )
)]
pub async fn download_status(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.downloader.progress())).into_response()
}
