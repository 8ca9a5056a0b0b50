//! Where uploaded files live and how the pipeline reads them back.

pub mod http;
pub mod local;

use anyhow::Result;
use async_trait::async_trait;

pub use http::{HttpBlobSource, file_url};
pub use local::{BlobError, LocalBlobStore, PresignedUpload};

/// Anything that can turn a blob URL into its bytes.
#[async_trait]
pub trait BlobSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
