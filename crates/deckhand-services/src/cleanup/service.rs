//! Periodic reclamation of abandoned sessions and upload temp files
//!
//! Long-idle sessions (e.g. a user who walked away mid-assembly) are
//! dropped from the session store, and `*.part` spool files left behind by
//! interrupted transfers are swept from the upload root. Published
//! artifacts are never touched here.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tokio::time::interval;

use crate::session::SessionStore;

#[derive(Debug, Default, Clone, Copy)]
pub struct CleanupSummary {
    pub sessions_expired: usize,
    pub temp_files_removed: usize,
}

pub struct CleanupService {
    store: Arc<SessionStore>,
    upload_root: PathBuf,
    idle_timeout: Duration,
    run_interval: Duration,
}

impl CleanupService {
    pub fn new(
        store: Arc<SessionStore>,
        upload_root: impl Into<PathBuf>,
        idle_timeout: Duration,
        run_interval: Duration,
    ) -> Self {
        Self {
            store,
            upload_root: upload_root.into(),
            idle_timeout,
            run_interval,
        }
    }

    /// Start the background cleanup task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut cleanup_interval = interval(self.run_interval);

            loop {
                cleanup_interval.tick().await;

                match self.run_once().await {
                    Ok(summary) => {
                        if summary.sessions_expired > 0 || summary.temp_files_removed > 0 {
                            tracing::info!(
                                sessions_expired = summary.sessions_expired,
                                temp_files_removed = summary.temp_files_removed,
                                "Cleanup pass completed"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Cleanup pass failed");
                    }
                }
            }
        })
    }

    /// One cleanup pass: expire idle sessions, then sweep stale spool files.
    pub async fn run_once(&self) -> Result<CleanupSummary, anyhow::Error> {
        let idle = chrono::Duration::from_std(self.idle_timeout)
            .map_err(|e| anyhow::anyhow!("idle timeout out of range: {}", e))?;
        let sessions_expired = self.store.expire_idle(idle);

        let temp_files_removed = self.sweep_stale_parts().await?;

        Ok(CleanupSummary {
            sessions_expired,
            temp_files_removed,
        })
    }

    /// Remove `*.part` files under the upload root older than the idle
    /// timeout. Recent ones are left alone; they may belong to a transfer
    /// still in flight.
    async fn sweep_stale_parts(&self) -> Result<usize, anyhow::Error> {
        if !self.upload_root.is_dir() {
            return Ok(0);
        }

        let mut removed = 0;
        let mut pending = vec![self.upload_root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                if !Self::is_stale_part(&path, entry.metadata().await.ok(), self.idle_timeout) {
                    continue;
                }

                match fs::remove_file(&path).await {
                    Ok(()) => {
                        tracing::info!(path = %path.display(), "Removed stale upload temp file");
                        removed += 1;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to remove stale upload temp file"
                        );
                    }
                }
            }
        }

        Ok(removed)
    }

    fn is_stale_part(
        path: &Path,
        metadata: Option<std::fs::Metadata>,
        idle_timeout: Duration,
    ) -> bool {
        if path.extension().and_then(|e| e.to_str()) != Some("part") {
            return false;
        }

        let Some(modified) = metadata.and_then(|m| m.modified().ok()) else {
            return false;
        };

        modified
            .elapsed()
            .map(|age| age >= idle_timeout)
            .unwrap_or(false)
    }
}
