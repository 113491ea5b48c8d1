//! Error types for knobgallery-dl
//!
//! Two layers of errors exist:
//! - [`Error`] — library-level failures (configuration, catalog
//!   acquisition, cache I/O, API server). These propagate with `?`.
//! - [`FetchError`] — per-file download failures. These are values the
//!   batch machinery accounts for; one asset's fetch failure never aborts
//!   a batch or a run.

use crate::types::FileKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for knobgallery-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for knobgallery-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download.batch_size")
        key: Option<String>,
    },

    /// Catalog acquisition failed (JSON listing and HTML fallback both exhausted)
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested catalog entry does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A scrape or download run is already holding the run slot
    #[error("{0} refused: another operation is already in progress")]
    Busy(&'static str),

    /// API server error
    #[error("API server error: {0}")]
    ApiServer(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failure of one logical download (one URL into one file path).
///
/// Everything except [`FetchError::MissingUrl`] and
/// [`FetchError::Cancelled`] is transient and consumed by the retry loop;
/// what callers ultimately see is [`FetchError::Exhausted`] wrapping the
/// final attempt's error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The catalog record carries no URL for this file. A data-quality
    /// problem in the catalog, not a network failure; never retried.
    #[error("missing {kind} URL for knob {id}")]
    MissingUrl {
        /// Id of the asset the record belongs to
        id: u64,
        /// Which of the asset's files lacked a URL
        kind: FileKind,
    },

    /// Server answered with a non-success status
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The status code the server returned
        status: reqwest::StatusCode,
        /// The URL that was fetched
        url: String,
    },

    /// Transport-level failure (connect, DNS, protocol)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The attempt exceeded the per-attempt timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Server returned a success status with an empty body
    #[error("empty response body from {url}")]
    EmptyBody {
        /// The URL that was fetched
        url: String,
    },

    /// Writing the response body to disk failed
    #[error("failed to write {path}: {source}")]
    Io {
        /// Destination path that could not be written
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// All attempts were consumed without success
    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted {
        /// Number of attempts that were made
        attempts: u32,
        /// The error from the final attempt
        last: Box<FetchError>,
    },

    /// Run cancellation was observed before an attempt started
    #[error("download cancelled")]
    Cancelled,
}
