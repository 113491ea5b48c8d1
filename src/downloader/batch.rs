//! Batch scheduling: fixed-size batches over a bounded worker pool
//!
//! The scheduler partitions the asset list into consecutive batches and
//! runs each batch through a `buffer_unordered` pool. Batches are strictly
//! sequential — a batch must fully finish before the next starts — which
//! bounds peak connection count and keeps progress messages batch-scoped.
//! Within a batch, completion order is unordered.
//!
//! Counting uses a single consumer task draining a channel of completion
//! events: every task sends exactly one event, the consumer is the only
//! writer, so `completed + failed` always equals the number of submitted
//! assets regardless of worker count or scheduling order.

use crate::error::{Error, Result};
use crate::fetcher::FileFetcher;
use crate::progress::ProgressTracker;
use crate::types::{BatchReport, DownloadOutcome, KnobAsset};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::task::{self, TaskDirs};

/// Options for one batch run.
#[derive(Clone, Copy, Debug)]
pub struct BatchOptions {
    /// Assets per worker-pool round
    pub batch_size: usize,
    /// Concurrent tasks within a round
    pub max_workers: usize,
}

/// What each worker does with an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TaskMode {
    /// Thumbnail plus payload; success tracks the payload
    Full,
    /// Thumbnail only; success tracks the thumbnail
    ThumbnailOnly,
}

/// Drives one run of batched downloads.
pub(crate) struct BatchScheduler {
    fetcher: FileFetcher,
    dirs: TaskDirs,
    progress: ProgressTracker,
    cancel: CancellationToken,
}

impl BatchScheduler {
    pub(crate) fn new(
        fetcher: FileFetcher,
        dirs: TaskDirs,
        progress: ProgressTracker,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            dirs,
            progress,
            cancel,
        }
    }

    /// Run every asset through the worker pool, batch by batch.
    ///
    /// Returns the aggregate report plus the mutated records. Records come
    /// back in completion order, not submission order; the caller merges
    /// them into its catalog by id.
    pub(crate) async fn run(
        &self,
        assets: Vec<KnobAsset>,
        options: BatchOptions,
        mode: TaskMode,
    ) -> Result<(BatchReport, Vec<KnobAsset>)> {
        if options.batch_size == 0 {
            return Err(Error::Config {
                message: "batch_size must be at least 1".to_string(),
                key: Some("download.batch_size".to_string()),
            });
        }
        if options.max_workers == 0 {
            return Err(Error::Config {
                message: "max_workers must be at least 1".to_string(),
                key: Some("download.max_workers".to_string()),
            });
        }

        let total = assets.len();
        self.progress
            .begin(total, format!("Starting download of {total} assets..."));

        // Single consumer: the only place counts accumulate and the only
        // writer to the progress snapshot while the run is live.
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<DownloadOutcome>();
        let progress = self.progress.clone();
        let consumer = tokio::spawn(async move {
            let mut completed = 0usize;
            let mut failed = 0usize;
            let mut updated = Vec::with_capacity(total);
            while let Some(outcome) = event_rx.recv().await {
                progress.record(outcome.succeeded);
                if outcome.succeeded {
                    completed += 1;
                    tracing::info!(knob_id = outcome.asset.id, completed, total, "Asset finished");
                } else {
                    failed += 1;
                }
                updated.push(outcome.asset);
            }
            (completed, failed, updated)
        });

        let batches: Vec<Vec<KnobAsset>> = assets
            .chunks(options.batch_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        let batch_count = batches.len();
        tracing::info!(
            total,
            batches = batch_count,
            batch_size = options.batch_size,
            workers = options.max_workers,
            "Starting batch download"
        );

        for (index, batch) in batches.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::warn!(
                    next_batch = index + 1,
                    total_batches = batch_count,
                    "Cancellation requested, not starting further batches"
                );
                break;
            }

            let batch_len = batch.len();
            self.progress.set_message(format!(
                "Batch {}/{}: downloading {} assets...",
                index + 1,
                batch_count,
                batch_len
            ));
            tracing::info!(
                batch = index + 1,
                total_batches = batch_count,
                size = batch_len,
                "Starting batch"
            );

            self.run_one_batch(batch, options.max_workers, mode, &event_tx)
                .await;

            let snapshot = self.progress.snapshot();
            self.progress.set_message(format!(
                "Completed batch {}/{}: {} downloaded, {} failed",
                index + 1,
                batch_count,
                snapshot.completed_items,
                snapshot.failed_items
            ));
        }

        // Closing the channel lets the consumer drain and return.
        drop(event_tx);
        let (completed, failed, updated) = consumer
            .await
            .map_err(|e| Error::Other(format!("progress consumer task failed: {e}")))?;

        self.progress.finish(completed, failed, total);
        tracing::info!(completed, failed, total, "Batch download finished");
        Ok((BatchReport { completed, failed }, updated))
    }

    /// Run one batch to completion through the bounded pool.
    ///
    /// Each asset is processed in its own spawned task so that an
    /// unexpected fault (panic) is caught at the join boundary, counted as
    /// a failure, and never aborts the batch. The spawn happens when the
    /// wrapper future is first polled, so `buffer_unordered` still bounds
    /// how many tasks exist at once.
    async fn run_one_batch(
        &self,
        batch: Vec<KnobAsset>,
        max_workers: usize,
        mode: TaskMode,
        event_tx: &mpsc::UnboundedSender<DownloadOutcome>,
    ) {
        stream::iter(batch)
            .map(|asset| {
                let fetcher = self.fetcher.clone();
                let dirs = self.dirs.clone();
                let event_tx = event_tx.clone();
                async move {
                    let id = asset.id;
                    let fallback = asset.clone();
                    let handle = match mode {
                        TaskMode::Full => tokio::spawn(task::download_asset(fetcher, dirs, asset)),
                        TaskMode::ThumbnailOnly => {
                            tokio::spawn(task::download_thumbnail_only(fetcher, dirs, asset))
                        }
                    };
                    let outcome = match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!(knob_id = id, error = %e, "Download task aborted unexpectedly");
                            DownloadOutcome {
                                asset: fallback,
                                succeeded: false,
                            }
                        }
                    };
                    // The consumer outlives every sender, so this only
                    // fails if the run is being torn down.
                    event_tx.send(outcome).ok();
                }
            })
            .buffer_unordered(max_workers)
            .collect::<Vec<()>>()
            .await;
    }
}
