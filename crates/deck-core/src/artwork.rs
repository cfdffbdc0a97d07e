//! Cover art: embedded pictures via `lofty`, remote fallback via the iTunes
//! search API.  Everything here is best effort and never fails a load.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lofty::file::TaggedFileExt;
use serde::Deserialize;
use tracing::debug;

use crate::config::ArtworkConfig;

const THUMB_TOKEN: &str = "100x100";
const LARGE_TOKEN: &str = "600x600";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    pub data: Vec<u8>,
    pub mime: String,
}

impl EmbeddedPicture {
    pub fn file_extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            _ => "bin",
        }
    }
}

pub trait TagExtractor: Send + Sync {
    /// First embedded picture of the file, if any.  Blocking.
    fn embedded_picture(&self, path: &Path) -> anyhow::Result<Option<EmbeddedPicture>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyExtractor;

impl TagExtractor for LoftyExtractor {
    fn embedded_picture(&self, path: &Path) -> anyhow::Result<Option<EmbeddedPicture>> {
        let tagged = lofty::read_from_path(path)
            .with_context(|| format!("reading tags of {}", path.display()))?;
        let picture = tagged
            .primary_tag()
            .and_then(|tag| tag.pictures().first())
            .or_else(|| tagged.tags().iter().find_map(|tag| tag.pictures().first()));
        Ok(picture.map(|p| EmbeddedPicture {
            data: p.data().to_vec(),
            mime: p
                .mime_type()
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "image/jpeg".to_string()),
        }))
    }
}

/// Run the extractor off the async runtime.  Errors, panics and timeouts all
/// resolve to `None`.
pub async fn extract_bounded(
    extractor: Arc<dyn TagExtractor>,
    path: PathBuf,
    timeout: Duration,
) -> Option<EmbeddedPicture> {
    let shown = path.display().to_string();
    let task = tokio::task::spawn_blocking(move || extractor.embedded_picture(&path));
    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(picture))) => picture,
        Ok(Ok(Err(e))) => {
            debug!("artwork: no tags for {}: {:#}", shown, e);
            None
        }
        Ok(Err(e)) => {
            debug!("artwork: extractor task failed for {}: {}", shown, e);
            None
        }
        Err(_) => {
            debug!("artwork: extraction timed out for {}", shown);
            None
        }
    }
}

/// Swap the thumbnail size token for the large one.  URLs without the token
/// come back unchanged.
pub fn upscale_artwork_url(url: &str) -> String {
    url.replacen(THUMB_TOKEN, LARGE_TOKEN, 1)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
}

#[derive(Clone)]
pub struct ArtworkResolver {
    http: reqwest::Client,
    base_url: String,
}

impl ArtworkResolver {
    pub fn new(config: &ArtworkConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look a title up and return the large artwork URL of the first match.
    pub async fn lookup(&self, title: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("term", title), ("limit", "1"), ("entity", "song")])
            .send()
            .await
            .context("artwork lookup request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("artwork lookup returned status: {}", response.status());
        }

        let data: SearchResponse = response
            .json()
            .await
            .context("failed to parse artwork lookup response")?;

        Ok(data
            .results
            .into_iter()
            .next()
            .and_then(|r| r.artwork_url_100)
            .map(|url| upscale_artwork_url(&url)))
    }
}
