//! System handlers: health check and OpenAPI spec.

use crate::api::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use utoipa::OpenApi;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "run_in_progress": state.downloader.is_running(),
        })),
    )
        .into_response()
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI 3.x document")
    )
)]
pub async fn openapi_spec() -> Response {
    (StatusCode::OK, Json(crate::api::ApiDoc::openapi())).into_response()
}
