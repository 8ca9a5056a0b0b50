use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::BlobSource;

/// Fetches blobs over HTTP(S). Reading `file://` URLs from disk is opt-in
/// and only meant for the local CLI.
#[derive(Debug, Clone, Default)]
pub struct HttpBlobSource {
    client: reqwest::Client,
    local_files: bool,
}

impl HttpBlobSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept `file://` URLs. Never use this for URLs from remote clients.
    pub fn with_local_files() -> Self {
        Self {
            local_files: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BlobSource for HttpBlobSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(path) = url.strip_prefix("file://")
            && self.local_files
        {
            return tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read {path}"));
        }

        let scheme = url.split_once("://").map(|(s, _)| s.to_ascii_lowercase());
        if !matches!(scheme.as_deref(), Some("http" | "https")) {
            warn!(url, "refusing blob URL with unsupported scheme");
            bail!("Unsupported blob URL scheme. URL: {url}");
        }

        debug!(url, "fetching blob");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !resp.status().is_success() {
            bail!("Failed to fetch blob: {}. URL: {}", resp.status(), url);
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

/// `file://` URL for a local path, as understood by
/// [`HttpBlobSource::with_local_files`].
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
