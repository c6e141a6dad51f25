//! Shared constants

/// File extension for serialized deck packages.
pub const DECK_FILE_EXTENSION: &str = "deck";

/// Media type recorded in the package's `mimetype` entry.
pub const DECK_MEDIA_TYPE: &str = "application/vnd.deckhand.deck+zip";

/// Font size applied to every content-slide bullet paragraph.
pub const DEFAULT_BULLET_FONT_PT: u16 = 18;

/// Offset (inches, from the top-left corner) at which image slides place
/// their picture.
pub const DEFAULT_IMAGE_OFFSET_IN: f32 = 1.0;

/// Current deck manifest schema version.
pub const DECK_MANIFEST_VERSION: u32 = 1;
