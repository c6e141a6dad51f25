//! Deckhand Storage Layer
//!
//! This crate defines the `ArtifactStore` abstraction for durably storing
//! untrusted binary artifacts (uploads and saved decks) and its local
//! filesystem implementation. Publishes are atomic: a concurrent reader of
//! a key never observes a partially written file.

pub mod keys;
pub mod local;
pub mod traits;

pub use keys::{saved_deck_key, upload_key};
pub use local::LocalArtifactStore;
pub use traits::{ArtifactStore, ByteStream, StorageError, StorageResult, StoredArtifact};
