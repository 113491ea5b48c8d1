//! REST API server module
//!
//! Serves the mirrored catalog and drives scrape/download operations over
//! an OpenAPI-documented axum router.

use crate::config::Config;
use crate::downloader::GalleryDownloader;
use crate::error::{Error, Result};
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Catalog
/// - `GET /knobs` - List catalog entries (paginated)
/// - `GET /knobs/:id` - Get single entry
/// - `GET /knobs/:id/preview` - Entry plus on-disk file state
///
/// ## Scraping
/// - `POST /scrape` - Refresh the catalog in the background
/// - `GET /scrape/status` - Scrape progress
///
/// ## Downloads
/// - `POST /knobs/:id/download` - Download one knob synchronously
/// - `POST /knobs/batch-download` - Background batch download
/// - `POST /thumbnails/download` - Background thumbnail-only download
/// - `GET /downloads/status` - Download progress
///
/// ## Settings
/// - `GET /settings` - Current runtime settings
/// - `PATCH /settings` - Update runtime settings
/// - `GET /settings/defaults` - Compiled-in defaults
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
pub fn create_router(downloader: Arc<GalleryDownloader>, config: Arc<Config>) -> Router {
    let state = AppState::new(downloader, config.clone());

    let router = Router::new()
        // Catalog
        .route("/knobs", get(routes::list_knobs))
        .route("/knobs/:id", get(routes::get_knob))
        .route("/knobs/:id/preview", get(routes::preview_knob))
        // Scraping
        .route("/scrape", post(routes::start_scrape))
        .route("/scrape/status", get(routes::scrape_status))
        // Downloads
        .route("/knobs/:id/download", post(routes::download_knob))
        .route("/knobs/batch-download", post(routes::batch_download))
        .route("/thumbnails/download", post(routes::download_thumbnails))
        .route("/downloads/status", get(routes::download_status))
        // Settings
        .route(
            "/settings",
            get(routes::get_settings).patch(routes::update_settings),
        )
        .route("/settings/defaults", get(routes::default_settings))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// Supports "*" for any origin — the default, so a browser frontend on a
/// dev server can talk to this backend without extra setup.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Binds a TCP listener and serves the router until the server stops,
/// either due to an error or process shutdown.
pub async fn start_api_server(
    downloader: Arc<GalleryDownloader>,
    config: Arc<Config>,
) -> Result<()> {
    let bind_address = config.api.bind_address;
    let app = create_router(downloader, config);

    let listener = TcpListener::bind(bind_address).await.map_err(Error::Io)?;
    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::ApiServer(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}
