//! Catalog acquisition from the remote gallery
//!
//! The gallery exposes a JSON listing endpoint (`?m=list`). Some
//! deployments serve it with broken UTF-8 and stray tab characters, so
//! the payload is sanitized before parsing. When the JSON endpoint fails
//! entirely the gallery page itself is scraped as a fallback.

mod html;

use crate::config::GalleryConfig;
use crate::error::{Error, Result};
use crate::types::KnobAsset;
use serde::Deserialize;

/// Gallery ids appear as integers in the JSON listing and as strings in
/// scraped HTML.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// Numeric id from the JSON listing
    Number(u64),
    /// String id from HTML attributes (or sloppy JSON)
    Text(String),
}

impl RawId {
    /// Numeric value, if the id parses as one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RawId::Number(n) => Some(*n),
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Raw catalog entry as returned by the listing endpoint or the HTML
/// fallback, before normalization into a [`KnobAsset`].
#[derive(Clone, Debug, Deserialize)]
pub struct RawKnob {
    /// Gallery id
    pub id: RawId,
    /// Payload filename
    pub file: String,
    /// Uploader
    #[serde(default)]
    pub author: Option<String>,
    /// License tag
    #[serde(default)]
    pub license: Option<String>,
    /// Upload date
    #[serde(default)]
    pub date: Option<String>,
    /// Uploader comment
    #[serde(default)]
    pub comment: Option<String>,
    /// Space-separated tags
    #[serde(default)]
    pub tags: Option<String>,
    /// Image dimensions
    #[serde(default)]
    pub size: Option<String>,
}

/// HTTP client for the gallery listing endpoints.
#[derive(Clone, Debug)]
pub struct GalleryClient {
    client: reqwest::Client,
    config: GalleryConfig,
}

impl GalleryClient {
    /// Build a client around the shared HTTP client.
    pub fn new(client: reqwest::Client, config: GalleryConfig) -> Self {
        Self { client, config }
    }

    /// Fetch the full catalog, preferring the JSON listing and falling
    /// back to scraping the gallery HTML when it fails.
    pub async fn fetch_catalog(&self) -> Result<Vec<KnobAsset>> {
        let raw = match self.fetch_listing().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "JSON listing failed, falling back to HTML scraping");
                self.fetch_html_fallback().await?
            }
        };

        if raw.is_empty() {
            return Err(Error::Catalog("gallery returned no entries".to_string()));
        }

        let assets = self.build_assets(raw);
        tracing::info!(count = assets.len(), "Fetched knob catalog from gallery");
        Ok(assets)
    }

    /// Fetch and parse the JSON listing endpoint.
    async fn fetch_listing(&self) -> Result<Vec<RawKnob>> {
        let url = format!("{}?m=list", self.config.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Catalog(format!("listing returned HTTP {status}")));
        }

        let body = response.bytes().await?;
        let text = sanitize_listing(&body);
        serde_json::from_str(&text)
            .map_err(|e| Error::Catalog(format!("listing is not valid JSON: {e}")))
    }

    /// Scrape the gallery page markup when the JSON listing is unusable.
    async fn fetch_html_fallback(&self) -> Result<Vec<RawKnob>> {
        let response = self.client.get(&self.config.base_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Catalog(format!(
                "gallery page returned HTTP {status}"
            )));
        }
        let body = response.text().await?;
        let entries = html::parse_gallery(&body);
        tracing::info!(count = entries.len(), "HTML fallback scraped gallery page");
        Ok(entries)
    }

    /// Normalize raw entries into catalog records with constructed URLs.
    ///
    /// Entries whose id cannot be parsed are logged and skipped; one bad
    /// row must not sink the whole catalog.
    pub fn build_assets(&self, raw: Vec<RawKnob>) -> Vec<KnobAsset> {
        raw.into_iter()
            .filter_map(|item| {
                let id = match item.id.as_u64() {
                    Some(id) => id,
                    None => {
                        tracing::warn!(id = ?item.id, file = %item.file, "Skipping catalog entry with unusable id");
                        return None;
                    }
                };

                let thumbnail_url =
                    format!("{}/{}.png", self.config.thumbnail_base_url, id);
                let download_url = format!(
                    "{}?m=get&n={}&t=bin&f={}",
                    self.config.base_url,
                    id,
                    urlencoding::encode(&item.file)
                );

                Some(KnobAsset {
                    id,
                    author: item.author.filter(|a| !a.is_empty()),
                    license: item.license.unwrap_or_else(|| "CC0".to_string()),
                    date: item.date.unwrap_or_default(),
                    comment: item.comment.unwrap_or_default(),
                    tags: item.tags.unwrap_or_default(),
                    size: item.size.filter(|s| !s.is_empty()),
                    thumbnail_url: Some(thumbnail_url),
                    download_url: Some(download_url),
                    local_path: None,
                    local_thumbnail_path: None,
                    downloaded: false,
                    file: item.file,
                })
            })
            .collect()
    }
}

/// Strip invalid UTF-8 and normalize the tab characters the listing
/// endpoint is known to emit inside string values.
fn sanitize_listing(body: &[u8]) -> String {
    String::from_utf8_lossy(body).replace('\t', " ")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GalleryClient {
        GalleryClient::new(reqwest::Client::new(), GalleryConfig::default())
    }

    #[test]
    fn listing_with_tabs_and_bad_utf8_still_parses() {
        let mut body = br#"[{"id": 1, "file": "a"#.to_vec();
        body.push(0xff); // invalid UTF-8 inside the filename
        body.extend_from_slice(b"\tb.knob\"}]");

        let text = sanitize_listing(&body);
        let raw: Vec<RawKnob> = serde_json::from_str(&text).unwrap();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].id.as_u64(), Some(1));
    }

    #[test]
    fn string_ids_are_accepted() {
        let raw: Vec<RawKnob> =
            serde_json::from_str(r#"[{"id": "17", "file": "x.knob"}]"#).unwrap();
        assert_eq!(raw[0].id.as_u64(), Some(17));
    }

    #[test]
    fn build_assets_constructs_urls() {
        let assets = client().build_assets(vec![RawKnob {
            id: RawId::Number(321),
            file: "shiny knob.knob".to_string(),
            author: Some("ana".to_string()),
            license: None,
            date: Some("2024-03-01".to_string()),
            comment: None,
            tags: None,
            size: None,
        }]);

        assert_eq!(assets.len(), 1);
        let asset = &assets[0];
        assert_eq!(asset.id, 321);
        assert_eq!(
            asset.thumbnail_url.as_deref(),
            Some("https://www.g200kg.com/en/webknobman/data/gal/321.png")
        );
        // The filename must be percent-encoded in the download query
        assert_eq!(
            asset.download_url.as_deref(),
            Some(
                "https://www.g200kg.com/en/webknobman/gallery.php?m=get&n=321&t=bin&f=shiny%20knob.knob"
            )
        );
        // Absent license falls back to the gallery default
        assert_eq!(asset.license, "CC0");
        assert!(!asset.downloaded);
    }

    #[test]
    fn entries_with_unusable_ids_are_skipped() {
        let assets = client().build_assets(vec![
            RawKnob {
                id: RawId::Text("not-a-number".to_string()),
                file: "bad.knob".to_string(),
                author: None,
                license: None,
                date: None,
                comment: None,
                tags: None,
                size: None,
            },
            RawKnob {
                id: RawId::Number(5),
                file: "good.knob".to_string(),
                author: None,
                license: None,
                date: None,
                comment: None,
                tags: None,
                size: None,
            },
        ]);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, 5);
    }
}
