//! Core types: catalog records, run outcomes, and progress snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use utoipa::ToSchema;

/// Which of an asset's two files a fetch concerns.
///
/// The distinction matters for success accounting: the knob payload is the
/// asset of record, the thumbnail is cosmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// The PNG thumbnail image shown in gallery listings
    Thumbnail,
    /// The `.knob` payload file itself
    Knob,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Thumbnail => write!(f, "thumbnail"),
            FileKind::Knob => write!(f, "knob"),
        }
    }
}

/// One catalog entry from the WebKnobMan gallery.
///
/// Metadata fields are carried verbatim from the gallery listing; the
/// `local_*` paths and `downloaded` flag are maintained by the downloader.
///
/// Invariant: `downloaded == true` only after the payload file has been
/// confirmed present at `local_path`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KnobAsset {
    /// Gallery-assigned id, unique and stable across runs
    pub id: u64,

    /// Payload filename as listed by the gallery
    pub file: String,

    /// Uploader, when the gallery lists one
    #[serde(default)]
    pub author: Option<String>,

    /// License tag carried verbatim from the gallery (e.g. "CC0", "CC-BY-4.0")
    #[serde(default)]
    pub license: String,

    /// Upload date as rendered by the gallery
    #[serde(default)]
    pub date: String,

    /// Uploader comment
    #[serde(default)]
    pub comment: String,

    /// Space-separated tag list
    #[serde(default)]
    pub tags: String,

    /// Image dimensions as rendered by the gallery
    #[serde(default)]
    pub size: Option<String>,

    /// Thumbnail image URL (absent = unavailable)
    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Payload download URL (absent = unavailable)
    #[serde(default)]
    pub download_url: Option<String>,

    /// Local payload path once registered by the downloader
    #[serde(default)]
    pub local_path: Option<PathBuf>,

    /// Local thumbnail path once registered by the downloader
    #[serde(default)]
    pub local_thumbnail_path: Option<PathBuf>,

    /// True only once the payload file is confirmed present on disk
    #[serde(default)]
    pub downloaded: bool,
}

impl KnobAsset {
    /// Destination filename for the payload file.
    ///
    /// The id prefix keeps files distinct when different uploads share a
    /// filename.
    pub fn payload_file_name(&self) -> String {
        format!("{}_{}", self.id, self.file)
    }

    /// Destination filename for the thumbnail.
    pub fn thumbnail_file_name(&self) -> String {
        format!("{}.png", self.id)
    }
}

/// Result of one asset task.
///
/// The task owns its record for the duration of the download and hands the
/// mutated record back here, so no two tasks ever share mutable state.
/// `succeeded` reflects only the payload outcome; a failed thumbnail never
/// flips it.
#[derive(Clone, Debug)]
pub struct DownloadOutcome {
    /// The record as mutated by the task (path fields, `downloaded` flag)
    pub asset: KnobAsset,
    /// Whether the payload file is present locally after the task
    pub succeeded: bool,
}

/// Aggregate counts returned by a batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchReport {
    /// Assets whose payload file is present locally
    pub completed: usize,
    /// Assets whose payload fetch failed
    pub failed: usize,
}

/// Point-in-time view of the current (or most recent) operation.
///
/// Returned by status-polling endpoints; always internally consistent
/// because all mutation happens under the tracker's lock.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ProgressSnapshot {
    /// Whether a scrape or download run is currently active
    pub in_progress: bool,
    /// Number of items the run covers
    pub total_items: usize,
    /// Items finished successfully so far
    pub completed_items: usize,
    /// Items that failed so far
    pub failed_items: usize,
    /// Set at finalization: true when at least one item completed
    pub success: bool,
    /// Human-readable status line
    pub message: String,
}

/// One page of the catalog as served by the REST layer.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GalleryPage {
    /// Records on this page
    pub knobs: Vec<KnobAsset>,
    /// Total number of records in the catalog
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    /// Total number of pages at the requested page size
    pub total_pages: usize,
}
