//! Per-asset download task
//!
//! One task downloads both files for one asset. The thumbnail is
//! cosmetic: its failure is logged and must never block marking the asset
//! as downloaded. The payload is the asset of record; its outcome alone
//! decides the task's success.

use crate::fetcher::FileFetcher;
use crate::types::{DownloadOutcome, FileKind, KnobAsset};
use std::path::PathBuf;

/// Destination directories an asset task writes into.
#[derive(Clone, Debug)]
pub(crate) struct TaskDirs {
    /// Payload files land here
    pub(crate) knobs_dir: PathBuf,
    /// Thumbnail images land here
    pub(crate) thumbnails_dir: PathBuf,
}

/// Download thumbnail and payload for one asset.
///
/// The task owns its record: local path fields are pre-registered before
/// each fetch (so a later run reuses them even when the fetch fails), and
/// the mutated record travels back inside the outcome.
pub(crate) async fn download_asset(
    fetcher: FileFetcher,
    dirs: TaskDirs,
    mut asset: KnobAsset,
) -> DownloadOutcome {
    // Thumbnail, only when no local copy is registered and present.
    let thumbnail_present = match &asset.local_thumbnail_path {
        Some(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
        None => false,
    };
    if !thumbnail_present {
        let dest = dirs.thumbnails_dir.join(asset.thumbnail_file_name());
        asset.local_thumbnail_path = Some(dest.clone());
        if let Err(e) = fetcher
            .fetch(asset.id, FileKind::Thumbnail, asset.thumbnail_url.as_deref(), &dest)
            .await
        {
            tracing::warn!(knob_id = asset.id, error = %e, "Thumbnail fetch failed, continuing with payload");
        }
    }

    // Payload; this is the outcome of record.
    let dest = dirs.knobs_dir.join(asset.payload_file_name());
    asset.local_path = Some(dest.clone());
    let succeeded = match fetcher
        .fetch(asset.id, FileKind::Knob, asset.download_url.as_deref(), &dest)
        .await
    {
        Ok(_) => {
            asset.downloaded = true;
            true
        }
        Err(e) => {
            tracing::error!(knob_id = asset.id, error = %e, "Payload fetch failed");
            false
        }
    };

    DownloadOutcome { asset, succeeded }
}

/// Thumbnail-only variant used by the bulk thumbnail operation.
///
/// Here the outcome reflects the thumbnail fetch itself; the payload and
/// its `downloaded` flag are left untouched.
pub(crate) async fn download_thumbnail_only(
    fetcher: FileFetcher,
    dirs: TaskDirs,
    mut asset: KnobAsset,
) -> DownloadOutcome {
    let dest = dirs.thumbnails_dir.join(asset.thumbnail_file_name());
    asset.local_thumbnail_path = Some(dest.clone());
    let succeeded = match fetcher
        .fetch(asset.id, FileKind::Thumbnail, asset.thumbnail_url.as_deref(), &dest)
        .await
    {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(knob_id = asset.id, error = %e, "Thumbnail fetch failed");
            false
        }
    };

    DownloadOutcome { asset, succeeded }
}
