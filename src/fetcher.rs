//! Single-file fetching with retries and idempotent skip
//!
//! A [`FileFetcher`] performs one logical download (one URL into one file
//! path) with a bounded attempt budget and a per-attempt timeout. If the
//! destination already exists the fetch short-circuits to success without
//! touching the network — the primary defense against redundant
//! re-downloads, both across runs and within one run.

use crate::config::RetryConfig;
use crate::error::FetchError;
use crate::types::FileKind;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Downloads one URL to one destination path.
///
/// Cheap to clone: the underlying `reqwest::Client` is an `Arc` around its
/// connection pool, so every task in a run shares the same pool.
#[derive(Clone, Debug)]
pub struct FileFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
    request_timeout: Duration,
    cancel: CancellationToken,
}

impl FileFetcher {
    /// Build a fetcher around a shared HTTP client.
    pub fn new(
        client: reqwest::Client,
        retry: RetryConfig,
        request_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            retry,
            request_timeout,
            cancel,
        }
    }

    /// Fetch `url` into `dest`, returning the destination path on success.
    ///
    /// - An existing `dest` returns immediately with zero network calls.
    /// - An absent or empty URL fails with [`FetchError::MissingUrl`]
    ///   without consuming any attempts: that is a catalog data-quality
    ///   problem, not a network error.
    /// - Otherwise up to `max_attempts` sequential attempts are made, each
    ///   bounded by the per-attempt timeout, with exponential backoff in
    ///   between. Only the final attempt's error surfaces, wrapped in
    ///   [`FetchError::Exhausted`].
    ///
    /// The response body is fully buffered before a single write, and a
    /// failed write removes whatever landed on disk, so no partial file is
    /// ever left behind to fool a later existence check.
    pub async fn fetch(
        &self,
        id: u64,
        kind: FileKind,
        url: Option<&str>,
        dest: &Path,
    ) -> Result<PathBuf, FetchError> {
        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            tracing::debug!(knob_id = id, kind = %kind, path = %dest.display(), "Destination exists, skipping fetch");
            return Ok(dest.to_path_buf());
        }

        let url = match url {
            Some(u) if !u.is_empty() => u,
            _ => {
                tracing::error!(knob_id = id, kind = %kind, "URL is missing in catalog record");
                return Err(FetchError::MissingUrl { id, kind });
            }
        };

        let mut delay = self.retry.initial_delay;
        let mut attempt = 0u32;
        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            attempt += 1;

            let err = match self.attempt(url, dest).await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(knob_id = id, kind = %kind, attempts = attempt, "Fetch succeeded after retry");
                    }
                    return Ok(dest.to_path_buf());
                }
                Err(err) => err,
            };

            if attempt >= self.retry.max_attempts {
                tracing::error!(
                    knob_id = id,
                    kind = %kind,
                    attempts = attempt,
                    error = %err,
                    "All fetch attempts failed"
                );
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            tracing::warn!(
                knob_id = id,
                kind = %kind,
                attempt,
                max_attempts = self.retry.max_attempts,
                error = %err,
                "Fetch attempt failed, retrying"
            );
            tokio::time::sleep(self.jittered(delay)).await;
            let next = Duration::from_secs_f64(delay.as_secs_f64() * self.retry.backoff_multiplier);
            delay = next.min(self.retry.max_delay);
        }
    }

    /// One HTTP attempt bounded by the per-attempt timeout.
    async fn attempt(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status,
                    url: url.to_string(),
                });
            }
            let body = response.bytes().await?;
            if body.is_empty() {
                return Err(FetchError::EmptyBody {
                    url: url.to_string(),
                });
            }
            if let Err(source) = tokio::fs::write(dest, &body).await {
                // Never leave a truncated file behind; a later run would
                // mistake it for a finished download.
                let _ = tokio::fs::remove_file(dest).await;
                return Err(FetchError::Io {
                    path: dest.to_path_buf(),
                    source,
                });
            }
            Ok(())
        };

        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.request_timeout)),
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.retry.jitter {
            add_jitter(delay)
        } else {
            delay
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd.
///
/// Uniformly distributed between 0% and 100% of the delay, so the actual
/// delay lands between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + factor))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    fn fetcher(max_attempts: u32) -> FileFetcher {
        FileFetcher::new(
            reqwest::Client::new(),
            fast_retry(max_attempts),
            Duration::from_secs(5),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn existing_destination_skips_the_network() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("1_a.knob");
        tokio::fs::write(&dest, b"already here").await.unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/file"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let url = format!("{}/file", server.uri());
        let result = fetcher(3)
            .fetch(1, FileKind::Knob, Some(&url), &dest)
            .await
            .unwrap();
        assert_eq!(result, dest);
        // Content untouched
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"already here");
    }

    #[tokio::test]
    async fn missing_url_fails_without_consuming_attempts() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("2.png");

        let err = fetcher(3)
            .fetch(2, FileKind::Thumbnail, None, &dest)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::MissingUrl {
                id: 2,
                kind: FileKind::Thumbnail
            }
        ));

        let err = fetcher(3)
            .fetch(2, FileKind::Thumbnail, Some(""), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingUrl { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn writes_body_on_first_success() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("3_b.knob");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knob/3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"knob-bytes".as_slice()))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/knob/3", server.uri());
        fetcher(3)
            .fetch(3, FileKind::Knob, Some(&url), &dest)
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"knob-bytes");
    }

    #[tokio::test]
    async fn retries_exactly_max_attempts_and_leaves_no_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("4_c.knob");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knob/4"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let url = format!("{}/knob/4", server.uri());
        let err = fetcher(3)
            .fetch(4, FileKind::Knob, Some(&url), &dest)
            .await
            .unwrap_err();
        match err {
            FetchError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, FetchError::HttpStatus { .. }));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("5_d.knob");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knob/5"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/knob/5"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".as_slice()))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/knob/5", server.uri());
        fetcher(3)
            .fetch(5, FileKind::Knob, Some(&url), &dest)
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"ok");
    }

    #[tokio::test]
    async fn empty_body_is_not_written() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("6_e.knob");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knob/6"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let url = format!("{}/knob/6", server.uri());
        let err = fetcher(2)
            .fetch(6, FileKind::Knob, Some(&url), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_first_attempt() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("7_f.knob");

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/knob/7"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".as_slice()))
            .expect(0)
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let fetcher = FileFetcher::new(
            reqwest::Client::new(),
            fast_retry(3),
            Duration::from_secs(5),
            cancel,
        );

        let url = format!("{}/knob/7", server.uri());
        let err = fetcher
            .fetch(7, FileKind::Knob, Some(&url), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }
}
