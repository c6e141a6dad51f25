//! Storage abstraction trait
//!
//! This module defines the ArtifactStore trait that storage backends must
//! implement, plus the storage error taxonomy.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use deckhand_core::AppError;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Stream exceeds size ceiling of {max_bytes} bytes")]
    PayloadTooLarge { max_bytes: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PayloadTooLarge { max_bytes } => AppError::PayloadTooLarge(format!(
                "File size exceeds maximum allowed size of {} MB",
                max_bytes / 1024 / 1024
            )),
            StorageError::NotFound(key) => {
                AppError::ResourceNotFound(format!("No stored artifact at {}", key))
            }
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Io(other.to_string()),
        }
    }
}

/// Inbound byte stream for an artifact.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Descriptor of a published artifact.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub key: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Storage abstraction trait
///
/// Backends store artifacts under flat, `/`-separated keys derived by
/// [`crate::keys`]. Writes publish atomically: the final key either holds
/// the complete previous content or the complete new content, never a
/// partial write.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stream an artifact to the given key and publish it atomically.
    ///
    /// Bytes are spooled to a temporary file next to the destination and
    /// renamed into place only after the stream completed and was synced.
    /// When `max_bytes` is given and the stream exceeds it, the temporary
    /// file is discarded and `PayloadTooLarge` is returned; nothing becomes
    /// visible at the key.
    async fn put_stream(
        &self,
        key: &str,
        reader: ByteStream,
        max_bytes: Option<u64>,
    ) -> StorageResult<StoredArtifact>;

    /// Store an in-memory buffer under the given key (same atomic publish).
    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<StoredArtifact>;

    /// Read back a stored artifact.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Check whether an artifact exists at the key.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Size in bytes of the stored artifact, if it exists.
    async fn content_length(&self, key: &str) -> StorageResult<u64>;

    /// Delete the artifact at the key. Deleting a missing key is not an
    /// error.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
