use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::traits::{ArtifactStore, ByteStream, StorageError, StorageResult, StoredArtifact};

/// Local filesystem storage implementation
///
/// Artifacts are published with a write-to-temp-then-rename protocol: the
/// byte stream is spooled to a uniquely named `*.part` file in the
/// destination directory, synced, and renamed over the final path. The
/// rename is what makes the artifact visible, so a concurrent reader of the
/// same key sees either the previous content or the new content in full.
#[derive(Clone)]
pub struct LocalArtifactStore {
    base_path: PathBuf,
}

impl LocalArtifactStore {
    /// Create a new LocalArtifactStore rooted at `base_path`
    /// (e.g. the configured upload or output root).
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalArtifactStore { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a storage key to a filesystem path with security validation.
    ///
    /// Keys containing path traversal sequences that could escape the base
    /// directory are rejected.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(key))
    }

    /// Temp file in the same directory as the destination, so the final
    /// rename never crosses a filesystem boundary.
    fn temp_path_for(path: &Path) -> PathBuf {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact");
        path.with_file_name(format!(".{}.{}.part", file_name, Uuid::new_v4()))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn discard_temp(tmp_path: &Path) {
        if let Err(e) = fs::remove_file(tmp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %tmp_path.display(),
                    error = %e,
                    "Failed to remove temporary upload file"
                );
            }
        }
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put_stream(
        &self,
        key: &str,
        mut reader: ByteStream,
        max_bytes: Option<u64>,
    ) -> StorageResult<StoredArtifact> {
        let path = self.key_to_path(key)?;
        self.ensure_parent_dir(&path).await?;

        let tmp_path = Self::temp_path_for(&path);
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&tmp_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create temporary file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        let mut written: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024];
        let copy_result: StorageResult<()> = loop {
            match reader.read(&mut buf).await {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    written += n as u64;
                    if let Some(max) = max_bytes {
                        if written > max {
                            break Err(StorageError::PayloadTooLarge { max_bytes: max });
                        }
                    }
                    if let Err(e) = file.write_all(&buf[..n]).await {
                        break Err(StorageError::UploadFailed(format!(
                            "Failed to write {}: {}",
                            tmp_path.display(),
                            e
                        )));
                    }
                }
                Err(e) => {
                    break Err(StorageError::UploadFailed(format!(
                        "Upload stream interrupted: {}",
                        e
                    )))
                }
            }
        };

        if let Err(e) = copy_result {
            drop(file);
            Self::discard_temp(&tmp_path).await;
            return Err(e);
        }

        if let Err(e) = file.sync_all().await {
            drop(file);
            Self::discard_temp(&tmp_path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                tmp_path.display(),
                e
            )));
        }
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            Self::discard_temp(&tmp_path).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to publish file {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            key = %key,
            path = %path.display(),
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local artifact publish successful"
        );

        Ok(StoredArtifact {
            key: key.to_string(),
            path,
            size_bytes: written,
        })
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<StoredArtifact> {
        let reader: ByteStream = Box::pin(std::io::Cursor::new(data));
        self.put_stream(key, reader, None).await
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            key = %key,
            size_bytes = data.len(),
            "Local artifact read successful"
        );

        Ok(data)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(key)?;
        let meta = fs::metadata(&path)
            .await
            .map_err(|_| StorageError::NotFound(key.to_string()))?;
        Ok(meta.len())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(key = %key, path = %path.display(), "Local artifact delete successful");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::tempdir;
    use tokio::io::{AsyncRead, ReadBuf};

    /// Reader that yields some bytes and then fails, simulating an
    /// interrupted transfer.
    struct FailingReader {
        remaining: usize,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.remaining == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "stream dropped",
                )));
            }
            let n = self.remaining.min(buf.remaining());
            buf.put_slice(&vec![0xAB; n]);
            self.remaining -= n;
            Poll::Ready(Ok(()))
        }
    }

    fn part_files(dir: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            for entry in std::fs::read_dir(&current).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().is_some_and(|e| e == "part") {
                    found.push(path);
                }
            }
        }
        found
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        let data = b"deck bytes".to_vec();
        let stored = store.put("uploads/7/deck.pptx", data.clone()).await.unwrap();

        assert_eq!(stored.key, "uploads/7/deck.pptx");
        assert_eq!(stored.size_bytes, data.len() as u64);
        assert!(stored.path.exists());

        let read_back = store.get("uploads/7/deck.pptx").await.unwrap();
        assert_eq!(read_back, data);
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        store.put("uploads/7/deck.pptx", b"first".to_vec()).await.unwrap();
        store.put("uploads/7/deck.pptx", b"second".to_vec()).await.unwrap();

        let read_back = store.get("uploads/7/deck.pptx").await.unwrap();
        assert_eq!(read_back, b"second");
        assert_eq!(store.content_length("uploads/7/deck.pptx").await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        let result = store.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_put_stream_over_ceiling_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        let reader: ByteStream = Box::pin(std::io::Cursor::new(vec![0u8; 2048]));
        let result = store.put_stream("uploads/7/big.deck", reader, Some(1024)).await;

        assert!(matches!(
            result,
            Err(StorageError::PayloadTooLarge { max_bytes: 1024 })
        ));
        assert!(!store.exists("uploads/7/big.deck").await.unwrap());
        assert!(part_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_interrupted_stream_never_publishes() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        let reader: ByteStream = Box::pin(FailingReader { remaining: 256 });
        let result = store.put_stream("uploads/7/deck.pptx", reader, None).await;

        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(!store.exists("uploads/7/deck.pptx").await.unwrap());
        assert!(part_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        assert!(store.delete("uploads/none.deck").await.is_ok());
    }

    #[tokio::test]
    async fn test_content_length_missing_key() {
        let dir = tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path()).await.unwrap();

        let result = store.content_length("uploads/none.deck").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
