//! Catalog read handlers.

use crate::api::AppState;
use crate::api::error_response::error_response;
use crate::types::KnobAsset;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for catalog pagination
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    #[serde(default = "default_page")]
    pub page: usize,
    /// Items per page, clamped to 1..=100 (default: 50)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    50
}

/// File-existence view of one catalog entry
#[derive(Debug, Serialize, ToSchema)]
pub struct KnobPreview {
    /// The catalog record
    pub knob: KnobAsset,
    /// Whether the registered thumbnail file is present on disk
    pub thumbnail_exists: bool,
    /// Whether the registered payload file is present on disk
    pub knob_file_exists: bool,
}

/// GET /knobs - List catalog entries with pagination
#[utoipa::path(
    get,
    path = "/knobs",
    tag = "knobs",
    params(PageQuery),
    responses(
        (status = 200, description = "One catalog page", body = crate::types::GalleryPage)
    )
)]
pub async fn list_knobs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = state.downloader.page(query.page, query.limit).await;
    (StatusCode::OK, Json(page)).into_response()
}

/// GET /knobs/:id - Get a single catalog entry
#[utoipa::path(
    get,
    path = "/knobs/{id}",
    tag = "knobs",
    params(("id" = u64, Path, description = "Knob id")),
    responses(
        (status = 200, description = "The catalog record", body = KnobAsset),
        (status = 404, description = "Unknown knob id")
    )
)]
pub async fn get_knob(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.downloader.get(id).await {
        Some(knob) => (StatusCode::OK, Json(knob)).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("knob {id} not found"),
        ),
    }
}

/// GET /knobs/:id/preview - Catalog record plus on-disk file state
#[utoipa::path(
    get,
    path = "/knobs/{id}/preview",
    tag = "knobs",
    params(("id" = u64, Path, description = "Knob id")),
    responses(
        (status = 200, description = "Record with file-existence flags", body = KnobPreview),
        (status = 404, description = "Unknown knob id")
    )
)]
pub async fn preview_knob(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let Some(knob) = state.downloader.get(id).await else {
        return error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("knob {id} not found"),
        );
    };

    let thumbnail_exists = match &knob.local_thumbnail_path {
        Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
        None => false,
    };
    let knob_file_exists = match &knob.local_path {
        Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
        None => false,
    };

    (
        StatusCode::OK,
        Json(KnobPreview {
            knob,
            thumbnail_exists,
            knob_file_exists,
        }),
    )
        .into_response()
}
