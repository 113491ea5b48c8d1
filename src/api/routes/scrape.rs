//! Catalog refresh handlers.

use crate::api::AppState;
use crate::api::error_response::error_response;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// POST /scrape - Refresh the catalog from the gallery in the background
#[utoipa::path(
    post,
    path = "/scrape",
    tag = "scrape",
    responses(
        (status = 202, description = "Scrape started in the background"),
        (status = 409, description = "A scrape or download run is already in progress")
    )
)]
pub async fn start_scrape(State(state): State<AppState>) -> Response {
    if state.downloader.is_running() {
        return error_response(
            StatusCode::CONFLICT,
            "operation_in_progress",
            "a scrape or download run is already in progress",
        );
    }

    let downloader = state.downloader.clone();
    tokio::spawn(async move {
        if let Err(e) = downloader.refresh_catalog().await {
            tracing::error!(error = %e, "Background scrape failed");
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({"message": "Started scraping gallery"})),
    )
        .into_response()
}

/// GET /scrape/status - Progress of the current or last scrape
#[utoipa::path(
    get,
    path = "/scrape/status",
    tag = "scrape",
    responses(
        (status = 200, description = "Progress snapshot", body = crate::types::ProgressSnapshot)
    )
)]
pub async fn scrape_status(State(state): State<AppState>) -> Response {
    (StatusCode::OK, Json(state.downloader.progress())).into_response()
}
