//! # knobgallery-dl
//!
//! Backend library for mirroring the WebKnobMan knob gallery: fetch the
//! catalog, download each knob's payload and thumbnail in retrying,
//! batched, concurrent runs, persist everything to local storage, and
//! serve the mirror over a REST API.
//!
//! ## Design Philosophy
//!
//! - **Idempotent** - files already on disk are never re-fetched; a run
//!   can be repeated safely after a crash or partial failure
//! - **Failure-tolerant** - one asset's failure never aborts a batch or a
//!   run; failures are counted and reported in aggregate
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding;
//!   the REST server is opt-in
//!
//! ## Quick Start
//!
//! ```no_run
//! use knobgallery_dl::{Config, GalleryDownloader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Arc::new(GalleryDownloader::new(Config::default()).await?);
//!
//!     // Serve the REST API in the background
//!     let api = downloader.spawn_api_server();
//!
//!     // Mirror the gallery
//!     downloader.refresh_catalog().await?;
//!     let report = downloader.download_all().await?;
//!     println!("downloaded {}, failed {}", report.completed, report.failed);
//!
//!     api.abort();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// On-disk catalog cache
pub mod cache;
/// Catalog acquisition from the remote gallery
pub mod catalog;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Single-file fetching with retries and idempotent skip
pub mod fetcher;
/// Run progress tracking
pub mod progress;
/// Core types
pub mod types;

// Re-export commonly used types
pub use cache::CacheStore;
pub use catalog::GalleryClient;
pub use config::{Config, RuntimeSettings, SettingsUpdate};
pub use downloader::{BatchOptions, GalleryDownloader};
pub use error::{Error, FetchError, Result};
pub use fetcher::FileFetcher;
pub use progress::ProgressTracker;
pub use types::{
    BatchReport, DownloadOutcome, FileKind, GalleryPage, KnobAsset, ProgressSnapshot,
};

/// Helper function to run a downloader until a termination signal arrives.
///
/// Waits for a termination signal and then requests shutdown, which stops
/// new batches and retry attempts while letting in-flight requests finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use knobgallery_dl::{Config, GalleryDownloader, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = Arc::new(GalleryDownloader::new(Config::default()).await?);
///     let api = downloader.spawn_api_server();
///
///     run_with_shutdown(&downloader).await?;
///     api.abort();
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: &GalleryDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown();
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
