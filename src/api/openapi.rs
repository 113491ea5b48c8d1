//! OpenAPI documentation definition.

use utoipa::OpenApi;

/// OpenAPI documentation for the knobgallery-dl REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "knobgallery-dl REST API",
        description = "Mirror and serve the WebKnobMan knob gallery",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        crate::api::routes::list_knobs,
        crate::api::routes::get_knob,
        crate::api::routes::preview_knob,
        crate::api::routes::start_scrape,
        crate::api::routes::scrape_status,
        crate::api::routes::download_knob,
        crate::api::routes::batch_download,
        crate::api::routes::download_thumbnails,
        crate::api::routes::download_status,
        crate::api::routes::get_settings,
        crate::api::routes::update_settings,
        crate::api::routes::default_settings,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::KnobAsset,
        crate::types::GalleryPage,
        crate::types::ProgressSnapshot,
        crate::types::BatchReport,
        crate::api::routes::KnobPreview,
        crate::api::routes::BatchDownloadRequest,
        crate::api::routes::SettingsResponse,
        crate::config::SettingsUpdate,
    )),
    tags(
        (name = "knobs", description = "Catalog reads"),
        (name = "scrape", description = "Catalog refresh"),
        (name = "downloads", description = "Download operations"),
        (name = "settings", description = "Runtime settings"),
        (name = "system", description = "Health and documentation")
    )
)]
pub struct ApiDoc;
