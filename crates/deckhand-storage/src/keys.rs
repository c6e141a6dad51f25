//! Shared key derivation for storage backends.
//!
//! Keys are deterministic in `(owner, filename)` so repeated uploads from
//! the same user overwrite predictably instead of accumulating.

use deckhand_core::constants::DECK_FILE_EXTENSION;
use deckhand_core::validation::sanitize_key_component;
use deckhand_core::UserId;

/// Key an uploaded artifact is published under: `uploads/{owner}/{filename}`.
///
/// `filename` must already be sanitized (see
/// `deckhand_core::validation::sanitize_filename`); the owner component is
/// sanitized here since identifiers are opaque.
pub fn upload_key(owner: &UserId, filename: &str) -> String {
    format!("uploads/{}/{}", sanitize_key_component(owner.as_str()), filename)
}

/// Key a session's saved deck is published under. One file per owner;
/// saving again overwrites.
pub fn saved_deck_key(owner: &UserId) -> String {
    format!(
        "decks/{}/presentation.{}",
        sanitize_key_component(owner.as_str()),
        DECK_FILE_EXTENSION
    )
}
