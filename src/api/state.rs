//! Shared state for API route handlers.

use crate::config::Config;
use crate::downloader::GalleryDownloader;
use std::sync::Arc;

/// State shared across all API routes.
#[derive(Clone)]
pub struct AppState {
    /// Downloader facade handling catalog and download operations
    pub downloader: Arc<GalleryDownloader>,
    /// Static configuration the server was started with
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state.
    pub fn new(downloader: Arc<GalleryDownloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}
