//! Configuration types for knobgallery-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Remote gallery endpoints
///
/// The listing, download, and thumbnail URLs are all derived from these
/// two bases, so tests (and alternate mirrors) can point the whole client
/// somewhere else by overriding them.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GalleryConfig {
    /// Gallery listing/download endpoint (default: the WebKnobMan gallery)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Base URL for thumbnail images; thumbnails live at `{base}/{id}.png`
    #[serde(default = "default_thumbnail_base_url")]
    pub thumbnail_base_url: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            thumbnail_base_url: default_thumbnail_base_url(),
        }
    }
}

/// Download behavior configuration (directories, concurrency, batching)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Root data directory (default: "./KnobGallery"). Payload files land
    /// in `knobs/`, thumbnails in `thumbnails/`, and the catalog cache at
    /// `knobs.json` underneath it.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum concurrent download tasks within a batch (default: 16)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Number of assets per batch (default: 20)
    ///
    /// Batches run strictly one after another; a batch must fully finish
    /// before the next starts, which bounds peak connection count and
    /// keeps progress messages batch-scoped.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-attempt timeout for a single download request (default: 15 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// TCP connect timeout for the shared HTTP client (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_workers: default_max_workers(),
            batch_size: default_batch_size(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl DownloadConfig {
    /// Directory payload files are written into.
    pub fn knobs_dir(&self) -> PathBuf {
        self.data_dir.join("knobs")
    }

    /// Directory thumbnail images are written into.
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.data_dir.join("thumbnails")
    }

    /// Path of the JSON catalog cache file.
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("knobs.json")
    }
}

/// Retry configuration for transient download failures
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of attempts per file (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between attempts (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8660)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Main configuration for [`GalleryDownloader`](crate::GalleryDownloader)
///
/// Fields are organized into logical sub-configs:
/// - [`gallery`](GalleryConfig) — remote endpoints
/// - [`download`](DownloadConfig) — directories, concurrency, batching
/// - [`retry`](RetryConfig) — attempt budget and backoff
/// - [`api`](ApiConfig) — REST server binding and CORS
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Remote gallery endpoints
    #[serde(default)]
    pub gallery: GalleryConfig,

    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Retry policy for transient fetch failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Reject degenerate values before any run can trip over them.
    ///
    /// A zero batch size would otherwise panic inside slice chunking, and
    /// zero workers would deadlock the pool, so both are refused here with
    /// the offending key named.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.gallery.base_url).is_err() {
            return Err(Error::Config {
                message: format!("base_url is not a valid URL: {}", self.gallery.base_url),
                key: Some("gallery.base_url".to_string()),
            });
        }
        if url::Url::parse(&self.gallery.thumbnail_base_url).is_err() {
            return Err(Error::Config {
                message: format!(
                    "thumbnail_base_url is not a valid URL: {}",
                    self.gallery.thumbnail_base_url
                ),
                key: Some("gallery.thumbnail_base_url".to_string()),
            });
        }
        if self.download.batch_size == 0 {
            return Err(Error::Config {
                message: "batch_size must be at least 1".to_string(),
                key: Some("download.batch_size".to_string()),
            });
        }
        if self.download.max_workers == 0 {
            return Err(Error::Config {
                message: "max_workers must be at least 1".to_string(),
                key: Some("download.max_workers".to_string()),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("retry.max_attempts".to_string()),
            });
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: "backoff_multiplier must be at least 1.0".to_string(),
                key: Some("retry.backoff_multiplier".to_string()),
            });
        }
        Ok(())
    }
}

/// Runtime-mutable download settings exposed through the REST layer
///
/// A snapshot of these is taken at the start of each run, so updating them
/// mid-run affects the next run, never one in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RuntimeSettings {
    /// Maximum concurrent download tasks within a batch
    pub max_workers: usize,
    /// Number of assets per batch
    pub batch_size: usize,
    /// Maximum number of attempts per file
    pub retry_attempts: u32,
}

impl RuntimeSettings {
    /// Initial settings as configured at startup.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_workers: config.download.max_workers,
            batch_size: config.download.batch_size,
            retry_attempts: config.retry.max_attempts,
        }
    }

    /// Same degenerate-value checks as [`Config::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config {
                message: "batch_size must be at least 1".to_string(),
                key: Some("batch_size".to_string()),
            });
        }
        if self.max_workers == 0 {
            return Err(Error::Config {
                message: "max_workers must be at least 1".to_string(),
                key: Some("max_workers".to_string()),
            });
        }
        if self.retry_attempts == 0 {
            return Err(Error::Config {
                message: "retry_attempts must be at least 1".to_string(),
                key: Some("retry_attempts".to_string()),
            });
        }
        Ok(())
    }
}

/// Partial update body for `PATCH /settings`
///
/// Absent fields keep their current value.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SettingsUpdate {
    /// New worker cap, if changing
    #[serde(default)]
    pub max_workers: Option<usize>,
    /// New batch size, if changing
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// New retry attempt budget, if changing
    #[serde(default)]
    pub retry_attempts: Option<u32>,
}

fn default_base_url() -> String {
    "https://www.g200kg.com/en/webknobman/gallery.php".to_string()
}

fn default_thumbnail_base_url() -> String {
    "https://www.g200kg.com/en/webknobman/data/gal".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("KnobGallery")
}

fn default_max_workers() -> usize {
    16
}

fn default_batch_size() -> usize {
    20
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8660))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Serialize Duration as whole seconds for readable config files
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
