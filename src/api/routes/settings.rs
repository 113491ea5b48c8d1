//! Runtime settings handlers.

use crate::api::AppState;
use crate::api::error_response::from_error;
use crate::config::{Config, RuntimeSettings, SettingsUpdate};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Settings as exposed over the API
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    /// Root data directory (startup-fixed)
    pub data_dir: String,
    /// Maximum concurrent download tasks within a batch
    pub max_workers: usize,
    /// Number of assets per batch
    pub batch_size: usize,
    /// Maximum number of attempts per file
    pub retry_attempts: u32,
}

impl SettingsResponse {
    fn new(config: &Config, settings: RuntimeSettings) -> Self {
        Self {
            data_dir: config.download.data_dir.display().to_string(),
            max_workers: settings.max_workers,
            batch_size: settings.batch_size,
            retry_attempts: settings.retry_attempts,
        }
    }
}

/// GET /settings - Current runtime settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Current settings", body = SettingsResponse)
    )
)]
pub async fn get_settings(State(state): State<AppState>) -> Response {
    let settings = state.downloader.settings().await;
    (
        StatusCode::OK,
        Json(SettingsResponse::new(&state.config, settings)),
    )
        .into_response()
}

/// PATCH /settings - Apply a partial settings update
///
/// Absent fields keep their current value; the update takes effect for the
/// next run.
#[utoipa::path(
    patch,
    path = "/settings",
    tag = "settings",
    request_body = SettingsUpdate,
    responses(
        (status = 200, description = "Updated settings", body = SettingsResponse),
        (status = 400, description = "Degenerate value rejected")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Response {
    match state.downloader.update_settings(update).await {
        Ok(settings) => (
            StatusCode::OK,
            Json(SettingsResponse::new(&state.config, settings)),
        )
            .into_response(),
        Err(e) => from_error(&e),
    }
}

/// GET /settings/defaults - Compiled-in default settings
#[utoipa::path(
    get,
    path = "/settings/defaults",
    tag = "settings",
    responses(
        (status = 200, description = "Default settings", body = SettingsResponse)
    )
)]
pub async fn default_settings() -> Response {
    let config = Config::default();
    let settings = RuntimeSettings::from_config(&config);
    (
        StatusCode::OK,
        Json(SettingsResponse::new(&config, settings)),
    )
        .into_response()
}
