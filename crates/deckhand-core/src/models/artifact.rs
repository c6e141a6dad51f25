//! Uploaded artifact descriptor

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::UserId;

/// A durably stored binary upload.
///
/// `stored_path` exists only after the full byte stream was received and
/// atomically published; a partially written file is never visible there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedArtifact {
    pub owner_id: UserId,
    /// Client-declared filename, as sanitized.
    pub declared_name: String,
    /// Client-declared size in bytes. Advisory; `size_bytes` is authoritative.
    pub declared_size: u64,
    /// Bytes actually written.
    pub size_bytes: u64,
    pub stored_path: PathBuf,
    pub stored_at: DateTime<Utc>,
}
