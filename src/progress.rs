//! Run progress tracking
//!
//! One [`ProgressTracker`] instance is owned by the downloader and threaded
//! through each run — there is no process-global status object. Workers
//! never touch the snapshot directly: their completion events are drained
//! by a single consumer task inside the batch scheduler, which is the only
//! writer for the duration of a run. The mutex exists so [`snapshot`]
//! can hand out torn-free copies to concurrent API readers.
//!
//! [`snapshot`]: ProgressTracker::snapshot

use crate::types::ProgressSnapshot;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to the progress state of the current (or last) run.
///
/// Cloning is cheap; all clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<ProgressSnapshot>>,
}

impl ProgressTracker {
    /// Create a tracker with an idle snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset state for a new run over `total` items.
    pub(crate) fn begin(&self, total: usize, message: String) {
        let mut state = self.lock();
        *state = ProgressSnapshot {
            in_progress: true,
            total_items: total,
            message,
            ..ProgressSnapshot::default()
        };
    }

    /// Record one finished task. Called only by the run's consumer task.
    pub(crate) fn record(&self, succeeded: bool) {
        let mut state = self.lock();
        if succeeded {
            state.completed_items += 1;
        } else {
            state.failed_items += 1;
        }
    }

    /// Replace the status message (batch transitions).
    pub(crate) fn set_message(&self, message: String) {
        self.lock().message = message;
    }

    /// Freeze the snapshot at the end of a batch run.
    pub(crate) fn finish(&self, completed: usize, failed: usize, total: usize) {
        let mut state = self.lock();
        state.in_progress = false;
        state.completed_items = completed;
        state.failed_items = failed;
        state.success = completed > 0;
        state.message = format!("Downloaded {completed}/{total} assets. Failed: {failed}");
    }

    /// Freeze the snapshot after a successful catalog refresh.
    pub(crate) fn finish_scrape(&self, count: usize) {
        let mut state = self.lock();
        state.in_progress = false;
        state.total_items = count;
        state.completed_items = count;
        state.success = true;
        state.message = format!("Fetched {count} knobs from the gallery");
    }

    /// Freeze the snapshot after a run failed before processing any items.
    pub(crate) fn fail(&self, message: String) {
        let mut state = self.lock();
        state.in_progress = false;
        state.success = false;
        state.message = message;
    }

    /// Clone the current state; safe to call from any thread while a run
    /// is active.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ProgressSnapshot> {
        // A poisoned lock means a writer panicked mid-update; the snapshot
        // is still usable, so recover it rather than propagating the panic.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
