//! Router tests driven through `tower::ServiceExt::oneshot`.

use super::*;
use crate::types::KnobAsset;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tempfile::tempdir;
use tower::ServiceExt;

async fn test_app() -> (Router, Arc<GalleryDownloader>, TempDir) {
    let dir = tempdir().expect("create temp dir");
    let mut config = Config::default();
    config.download.data_dir = dir.path().to_path_buf();
    let downloader = Arc::new(
        GalleryDownloader::new(config)
            .await
            .expect("create downloader"),
    );
    let app = create_router(downloader.clone(), downloader.config());
    (app, downloader, dir)
}

fn asset(id: u64) -> KnobAsset {
    KnobAsset {
        id,
        file: format!("f{id}.knob"),
        author: None,
        license: "CC0".to_string(),
        date: String::new(),
        comment: String::new(),
        tags: String::new(),
        size: None,
        thumbnail_url: None,
        download_url: None,
        local_path: None,
        local_thumbnail_path: None,
        downloaded: false,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_name_and_version() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["run_in_progress"], false);
}

#[tokio::test]
async fn knobs_listing_paginates() {
    let (app, downloader, _dir) = test_app().await;
    downloader
        .seed_catalog(vec![asset(1), asset(2), asset(3)])
        .await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/knobs?page=1&limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["knobs"].as_array().unwrap().len(), 2);
    assert_eq!(body["knobs"][0]["id"], 1);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/knobs?page=2&limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["knobs"].as_array().unwrap().len(), 1);
    assert_eq!(body["knobs"][0]["id"], 3);
}

#[tokio::test]
async fn unknown_knob_is_404_with_error_body() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/knobs/9000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn preview_reports_missing_files() {
    let (app, downloader, _dir) = test_app().await;
    downloader.seed_catalog(vec![asset(1)]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/knobs/1/preview")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["knob"]["id"], 1);
    assert_eq!(body["thumbnail_exists"], false);
    assert_eq!(body["knob_file_exists"], false);
}

#[tokio::test]
async fn scrape_status_starts_idle() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/scrape/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["in_progress"], false);
    assert_eq!(body["total_items"], 0);
}

#[tokio::test]
async fn settings_round_trip() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/settings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["batch_size"], 20);
    assert_eq!(body["max_workers"], 16);
    assert_eq!(body["retry_attempts"], 3);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/settings")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"batch_size": 5}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["batch_size"], 5);
    assert_eq!(body["max_workers"], 16);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/settings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["batch_size"], 5);
}

#[tokio::test]
async fn degenerate_settings_are_rejected() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/settings")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"batch_size": 0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "invalid_config");
}

#[tokio::test]
async fn batch_download_rejects_empty_id_list() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/knobs/batch-download")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"knob_ids": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "empty_request");
}

#[tokio::test]
async fn download_of_unknown_knob_is_404() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/knobs/9000/download")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn openapi_spec_covers_all_routes() {
    let (app, _downloader, _dir) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert!(body["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(body["info"]["title"], "knobgallery-dl REST API");

    let paths = body["paths"].as_object().unwrap();
    for expected in [
        "/knobs",
        "/knobs/{id}",
        "/knobs/{id}/preview",
        "/knobs/{id}/download",
        "/knobs/batch-download",
        "/scrape",
        "/scrape/status",
        "/thumbnails/download",
        "/downloads/status",
        "/settings",
        "/settings/defaults",
        "/health",
    ] {
        assert!(paths.contains_key(expected), "missing path {expected}");
    }

    let schemas = body["components"]["schemas"].as_object().unwrap();
    for expected in ["KnobAsset", "GalleryPage", "ProgressSnapshot", "BatchReport"] {
        assert!(schemas.contains_key(expected), "missing schema {expected}");
    }
}
