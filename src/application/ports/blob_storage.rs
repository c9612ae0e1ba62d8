use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("IO error: {0}")]
    IoError(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBlob {
    pub pathname: String,
    pub url: String,
    pub size: u64,
}

/// Publicly readable object storage addressed by slash-separated pathnames.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Overwrites an existing blob with the same pathname.
    async fn put(&self, pathname: &str, data: &[u8]) -> Result<StoredBlob, BlobStorageError>;

    async fn delete(&self, pathname: &str) -> Result<bool, BlobStorageError>;

    async fn list(&self, prefix: &str) -> Result<Vec<StoredBlob>, BlobStorageError>;

    fn url_for(&self, pathname: &str) -> String;

    fn pathname_from_url(&self, url: &str) -> Result<String, BlobStorageError>;
}
