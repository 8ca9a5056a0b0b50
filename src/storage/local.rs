//! Directory-backed blob store with signed upload URLs.
//!
//! Clients ask for an upload URL, `PUT` the file to it, then submit the
//! returned URL with the form. The signature is `SHA-256(secret ":" key)`,
//! URL-safe base64, so only keys handed out by [`LocalBlobStore::presign`]
//! can be written.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngExt;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{BlobSource, HttpBlobSource};

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("no upload signing secret is configured")]
    MissingSecret,
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
    #[error("upload token does not match blob key")]
    BadToken,
    #[error("blob storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// What a client needs to upload one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub token_payload: String,
}

pub struct LocalBlobStore {
    dir: PathBuf,
    public_base: String,
    secret: Option<String>,
    fallback: HttpBlobSource,
}

impl LocalBlobStore {
    /// Open (creating if needed) a store rooted at `dir`, serving blobs
    /// under `<public_base>/blobs/`.
    pub fn open(dir: impl Into<PathBuf>, public_base: &str, secret: Option<String>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create blob directory {}", dir.display()))?;
        Ok(Self {
            dir,
            public_base: public_base.trim_end_matches('/').to_string(),
            secret: secret.filter(|s| !s.is_empty()),
            fallback: HttpBlobSource::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn can_sign(&self) -> bool {
        self.secret.is_some()
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/blobs/{}", self.public_base, key)
    }

    /// Hand out a signed upload URL for `pathname`. A random suffix keeps
    /// repeated uploads of the same name apart.
    pub fn presign(&self, pathname: &str, content_type: Option<&str>) -> Result<PresignedUpload, BlobError> {
        let secret = self.secret.as_deref().ok_or(BlobError::MissingSecret)?;
        let key = with_random_suffix(&sanitize_key(pathname));
        let token = sign(secret, &key);

        let payload = serde_json::json!({
            "pathname": pathname,
            "key": key,
            "contentType": content_type,
        });

        info!(key, "presigned upload");
        Ok(PresignedUpload {
            upload_url: format!("{}?token={}", self.url_for(&key), token),
            token_payload: payload.to_string(),
        })
    }

    /// Store an upload after checking its token. Returns the blob's public URL.
    pub async fn put(&self, key: &str, token: &str, bytes: &[u8]) -> Result<String, BlobError> {
        let secret = self.secret.as_deref().ok_or(BlobError::MissingSecret)?;
        check_key(key)?;
        if sign(secret, key) != token {
            return Err(BlobError::BadToken);
        }
        tokio::fs::write(self.dir.join(key), bytes).await?;
        info!(key, bytes = bytes.len(), "stored blob");
        Ok(self.url_for(key))
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        check_key(key)?;
        match tokio::fs::read(self.dir.join(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn own_key<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url
            .strip_prefix(self.public_base.as_str())?
            .strip_prefix("/blobs/")?;
        Some(rest.split(['?', '#']).next().unwrap_or(rest))
    }
}

#[async_trait]
impl BlobSource for LocalBlobStore {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        match self.own_key(url) {
            Some(key) => {
                debug!(key, "reading blob from local store");
                self.get(key)
                    .await?
                    .with_context(|| format!("Failed to fetch blob: 404 Not Found. URL: {url}"))
            }
            None => self.fallback.fetch(url).await,
        }
    }
}

fn sign(secret: &str, key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(key.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Reduce a client-supplied pathname to a flat, safe file name.
pub fn sanitize_key(pathname: &str) -> String {
    let last = pathname.rsplit(['/', '\\']).next().unwrap_or(pathname);
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn check_key(key: &str) -> Result<(), BlobError> {
    if key.is_empty() || sanitize_key(key) != key {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn with_random_suffix(name: &str) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 6] = rng.random();
    let suffix: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{suffix}.{ext}"),
        _ => format!("{name}-{suffix}"),
    }
}
