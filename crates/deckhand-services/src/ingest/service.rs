//! Upload ingestion pipeline
//!
//! Validates and durably stores an inbound binary artifact, then confirms
//! it parses as a deck. Stages: size gate → sanitize → capped streaming
//! store (atomic publish) → structural validation.

use std::sync::Arc;

use chrono::Utc;
use deckhand_core::models::{Deck, UploadedArtifact, UserId};
use deckhand_core::validation::{sanitize_filename, validate_declared_size};
use deckhand_core::AppError;
use deckhand_storage::{upload_key, ArtifactStore, ByteStream};

/// Result of a successful ingest: the artifact descriptor plus the parsed
/// deck and its slide count for the caller's confirmation message.
#[derive(Debug)]
pub struct IngestedUpload {
    pub artifact: UploadedArtifact,
    pub deck: Deck,
    pub slide_count: usize,
}

pub struct UploadIngestor {
    store: Arc<dyn ArtifactStore>,
    max_upload_size_bytes: u64,
}

impl UploadIngestor {
    pub fn new(store: Arc<dyn ArtifactStore>, max_upload_size_bytes: u64) -> Self {
        Self {
            store,
            max_upload_size_bytes,
        }
    }

    /// Ingest one uploaded document.
    ///
    /// The declared size is checked before any byte of the stream is read;
    /// the actual byte count is capped independently, since the declared
    /// size is advisory. The destination key is deterministic in
    /// `(owner_id, declared_name)`, so a repeat upload overwrites its
    /// predecessor instead of accumulating.
    ///
    /// A stored artifact that fails structural validation is retained on
    /// disk for diagnostics, but the ingest still reports `CorruptDocument`.
    #[tracing::instrument(
        skip(self, reader),
        fields(owner_id = %owner_id, filename = %declared_name, declared_size)
    )]
    pub async fn ingest(
        &self,
        owner_id: &UserId,
        declared_name: &str,
        declared_size: u64,
        reader: ByteStream,
    ) -> Result<IngestedUpload, AppError> {
        validate_declared_size(declared_size, self.max_upload_size_bytes)?;

        let filename = sanitize_filename(declared_name)?;
        let key = upload_key(owner_id, &filename);

        let stored = self
            .store
            .put_stream(&key, reader, Some(self.max_upload_size_bytes))
            .await
            .map_err(AppError::from)?;

        let bytes = self.store.get(&key).await.map_err(AppError::from)?;
        let deck = deckhand_slides::package::load(&bytes).inspect_err(|_| {
            tracing::warn!(
                path = %stored.path.display(),
                size_bytes = stored.size_bytes,
                "Uploaded document failed structural validation; artifact retained for diagnostics"
            );
        })?;

        let slide_count = deck.slide_count();
        tracing::info!(
            path = %stored.path.display(),
            size_bytes = stored.size_bytes,
            slide_count,
            "Upload ingested"
        );

        Ok(IngestedUpload {
            artifact: UploadedArtifact {
                owner_id: owner_id.clone(),
                declared_name: filename,
                declared_size,
                size_bytes: stored.size_bytes,
                stored_path: stored.path,
                stored_at: Utc::now(),
            },
            deck,
            slide_count,
        })
    }
}
