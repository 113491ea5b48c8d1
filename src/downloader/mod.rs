//! Gallery mirroring facade split into focused submodules
//!
//! - [`batch`] — batch scheduling over the bounded worker pool
//! - [`task`] — per-asset download composition
//!
//! [`GalleryDownloader`] ties them together with the catalog, the JSON
//! cache, the shared HTTP client, and the progress tracker.

mod batch;
mod task;


pub use batch::BatchOptions;
pub(crate) use batch::{BatchScheduler, TaskMode};
pub(crate) use task::TaskDirs;

use crate::cache::CacheStore;
use crate::catalog::GalleryClient;
use crate::config::{Config, RetryConfig, RuntimeSettings, SettingsUpdate};
use crate::error::{Error, Result};
use crate::fetcher::FileFetcher;
use crate::progress::ProgressTracker;
use crate::types::{BatchReport, GalleryPage, KnobAsset, ProgressSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Main downloader instance (cloneable - all fields are Arc-wrapped or cheap)
///
/// Owns the in-memory catalog, the on-disk cache, the shared HTTP client,
/// and the progress tracker. Only one scrape or download run may be active
/// at a time; a second request is refused with [`Error::Busy`].
#[derive(Clone)]
pub struct GalleryDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    config: Arc<Config>,
    /// Shared HTTP client (connection pool reused by all fetches)
    client: reqwest::Client,
    /// Catalog listing client
    gallery: GalleryClient,
    /// In-memory catalog, mirrored to the JSON cache after mutations
    catalog: Arc<RwLock<Vec<KnobAsset>>>,
    /// JSON cache store
    cache: CacheStore,
    /// Progress state of the current (or last) run
    progress: ProgressTracker,
    /// Runtime-mutable download settings
    settings: Arc<RwLock<RuntimeSettings>>,
    /// Cancellation signal for in-flight runs (terminal; set by shutdown)
    cancel: CancellationToken,
    /// Guards the single-run-at-a-time slot
    run_active: Arc<AtomicBool>,
}

/// RAII guard for the run slot; dropping it frees the slot even when a run
/// errors out early.
struct RunSlot {
    flag: Arc<AtomicBool>,
}

impl Drop for RunSlot {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl GalleryDownloader {
    /// Create a new downloader instance.
    ///
    /// Validates the configuration, ensures the destination directories
    /// exist, builds the shared HTTP client, and loads any cached catalog
    /// from disk.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        for dir in [config.download.knobs_dir(), config.download.thumbnails_dir()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", dir.display(), e),
                ))
            })?;
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.download.connect_timeout)
            .build()?;

        let cache = CacheStore::new(config.download.cache_path());
        let catalog = cache.load().await;

        let gallery = GalleryClient::new(client.clone(), config.gallery.clone());
        let settings = RuntimeSettings::from_config(&config);

        Ok(Self {
            config: Arc::new(config),
            client,
            gallery,
            catalog: Arc::new(RwLock::new(catalog)),
            cache,
            progress: ProgressTracker::new(),
            settings: Arc::new(RwLock::new(settings)),
            cancel: CancellationToken::new(),
            run_active: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get the current configuration (cheap Arc clone).
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Snapshot of the current (or last) run's progress.
    ///
    /// Safe to call from any thread while a run is active; the snapshot is
    /// never torn.
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Current runtime-mutable settings.
    pub async fn settings(&self) -> RuntimeSettings {
        *self.settings.read().await
    }

    /// Apply a partial settings update after validation.
    ///
    /// Takes effect for the next run; a run already in flight keeps the
    /// snapshot it started with.
    pub async fn update_settings(&self, update: SettingsUpdate) -> Result<RuntimeSettings> {
        let mut guard = self.settings.write().await;
        let mut next = *guard;
        if let Some(max_workers) = update.max_workers {
            next.max_workers = max_workers;
        }
        if let Some(batch_size) = update.batch_size {
            next.batch_size = batch_size;
        }
        if let Some(retry_attempts) = update.retry_attempts {
            next.retry_attempts = retry_attempts;
        }
        next.validate()?;
        *guard = next;
        tracing::info!(
            max_workers = next.max_workers,
            batch_size = next.batch_size,
            retry_attempts = next.retry_attempts,
            "Runtime settings updated"
        );
        Ok(next)
    }

    /// True while a scrape or download run holds the run slot.
    pub fn is_running(&self) -> bool {
        self.run_active.load(Ordering::SeqCst)
    }

    /// Refresh the catalog from the remote gallery and persist it.
    ///
    /// Replaces the in-memory catalog wholesale; local download state is
    /// recovered lazily by the existence checks on the next download run.
    pub async fn refresh_catalog(&self) -> Result<usize> {
        let _slot = self.acquire_run_slot("scrape")?;
        self.progress
            .begin(0, "Fetching gallery catalog...".to_string());

        let assets = match self.gallery.fetch_catalog().await {
            Ok(assets) => assets,
            Err(e) => {
                self.progress.fail(format!("Catalog fetch failed: {e}"));
                return Err(e);
            }
        };

        let count = assets.len();
        {
            let mut catalog = self.catalog.write().await;
            *catalog = assets;
        }
        self.save_cache().await?;
        self.progress.finish_scrape(count);
        Ok(count)
    }

    /// Download payload and thumbnail for every catalog entry.
    pub async fn download_all(&self) -> Result<BatchReport> {
        let assets = self.catalog.read().await.clone();
        self.run_assets(assets, TaskMode::Full, "download").await
    }

    /// Download a selection of catalog entries by id.
    ///
    /// Unknown ids are skipped; if none remain the call fails with
    /// [`Error::NotFound`].
    pub async fn download_many(&self, ids: &[u64]) -> Result<BatchReport> {
        let assets: Vec<KnobAsset> = {
            let catalog = self.catalog.read().await;
            ids.iter()
                .filter_map(|id| catalog.iter().find(|k| k.id == *id).cloned())
                .collect()
        };
        if assets.is_empty() {
            return Err(Error::NotFound(
                "none of the requested knob ids exist in the catalog".to_string(),
            ));
        }
        self.run_assets(assets, TaskMode::Full, "batch-download").await
    }

    /// Download both files for a single catalog entry.
    pub async fn download_one(&self, id: u64) -> Result<BatchReport> {
        let asset = self
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("knob {id}")))?;
        self.run_assets(vec![asset], TaskMode::Full, "download").await
    }

    /// Fetch thumbnails for the entire catalog, leaving payloads alone.
    pub async fn download_thumbnails(&self) -> Result<BatchReport> {
        let assets = self.catalog.read().await.clone();
        self.run_assets(assets, TaskMode::ThumbnailOnly, "thumbnail-download")
            .await
    }

    /// One catalog page for the REST layer.
    pub async fn page(&self, page: usize, limit: usize) -> GalleryPage {
        let catalog = self.catalog.read().await;
        let total = catalog.len();
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        let start = (page - 1).saturating_mul(limit);
        let knobs = if start < total {
            catalog.iter().skip(start).take(limit).cloned().collect()
        } else {
            Vec::new()
        };
        let total_pages = if total == 0 { 1 } else { total.div_ceil(limit) };
        GalleryPage {
            knobs,
            total,
            page,
            total_pages,
        }
    }

    /// Look up a single catalog record by id.
    pub async fn get(&self, id: u64) -> Option<KnobAsset> {
        self.catalog
            .read()
            .await
            .iter()
            .find(|k| k.id == id)
            .cloned()
    }

    /// Request cancellation of any in-flight run.
    ///
    /// New batches and retry attempts stop; requests already on the wire
    /// complete naturally. Terminal: a downloader that has been shut down
    /// does not start new work.
    pub fn shutdown(&self) {
        tracing::info!("Shutdown requested, in-flight downloads will wind down");
        self.cancel.cancel();
    }

    /// Spawn the REST API server in a background task.
    ///
    /// The server runs concurrently with download processing and listens
    /// on the configured bind address.
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = Arc::clone(self);
        let config = downloader.config();
        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }

    /// Run a set of records through the batch scheduler and fold the
    /// mutated records back into the catalog and cache.
    async fn run_assets(
        &self,
        assets: Vec<KnobAsset>,
        mode: TaskMode,
        operation: &'static str,
    ) -> Result<BatchReport> {
        let _slot = self.acquire_run_slot(operation)?;

        let settings = *self.settings.read().await;
        let options = BatchOptions {
            batch_size: settings.batch_size,
            max_workers: settings.max_workers,
        };
        let retry = RetryConfig {
            max_attempts: settings.retry_attempts,
            ..self.config.retry.clone()
        };
        let fetcher = FileFetcher::new(
            self.client.clone(),
            retry,
            self.config.download.request_timeout,
            self.cancel.clone(),
        );
        let dirs = TaskDirs {
            knobs_dir: self.config.download.knobs_dir(),
            thumbnails_dir: self.config.download.thumbnails_dir(),
        };
        let scheduler = BatchScheduler::new(
            fetcher,
            dirs,
            self.progress.clone(),
            self.cancel.clone(),
        );

        tracing::info!(operation, count = assets.len(), "Starting run");
        let (report, updated) = scheduler.run(assets, options, mode).await?;

        self.merge_updates(updated).await;
        self.save_cache().await?;
        Ok(report)
    }

    /// Write task-mutated records back into the shared catalog by id.
    async fn merge_updates(&self, updated: Vec<KnobAsset>) {
        let mut catalog = self.catalog.write().await;
        for record in updated {
            if let Some(slot) = catalog.iter_mut().find(|k| k.id == record.id) {
                *slot = record;
            }
        }
    }

    async fn save_cache(&self) -> Result<()> {
        let catalog = self.catalog.read().await;
        self.cache.save(&catalog).await
    }

    fn acquire_run_slot(&self, operation: &'static str) -> Result<RunSlot> {
        if self
            .run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Busy(operation));
        }
        Ok(RunSlot {
            flag: Arc::clone(&self.run_active),
        })
    }

    /// Replace the in-memory catalog directly. Test seam; production code
    /// goes through [`refresh_catalog`](Self::refresh_catalog).
    #[cfg(test)]
    pub(crate) async fn seed_catalog(&self, assets: Vec<KnobAsset>) {
        let mut catalog = self.catalog.write().await;
        *catalog = assets;
    }
}
