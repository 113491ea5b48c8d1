//! On-disk catalog cache
//!
//! The catalog is persisted as pretty-printed JSON so runs can pick up
//! where a previous one left off. Saves go through a `.tmp` sibling and a
//! rename, so a crash mid-write cannot leave a torn cache file.

use crate::error::Result;
use crate::types::KnobAsset;
use std::path::{Path, PathBuf};

/// Loads and saves the knob catalog as a JSON file.
#[derive(Clone, Debug)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Create a store backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached catalog.
    ///
    /// A missing file is a normal first run and yields an empty catalog;
    /// a corrupt file is logged and likewise yields an empty catalog
    /// rather than failing startup.
    pub async fn load(&self) -> Vec<KnobAsset> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read knob cache");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<KnobAsset>>(&bytes) {
            Ok(knobs) => {
                tracing::info!(count = knobs.len(), "Loaded knob catalog from cache");
                knobs
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt knob cache");
                Vec::new()
            }
        }
    }

    /// Persist the catalog, replacing any previous cache file.
    pub async fn save(&self, knobs: &[KnobAsset]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(knobs)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::info!(count = knobs.len(), path = %self.path.display(), "Saved knob catalog");
        Ok(())
    }
}
