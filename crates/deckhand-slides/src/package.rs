//! Deck package format
//!
//! A deck is stored as a zip container holding a stored `mimetype` entry, a
//! JSON manifest (`deck.json`) describing the slides, and one `media/*`
//! entry per embedded image, written in slide order. Entry metadata is
//! pinned so that identical decks serialize to identical bytes within one
//! manifest version; byte stability *across* versions is not promised.

use std::io::{Cursor, Read, Write};

use bytes::Bytes;
use deckhand_core::constants::{DECK_MANIFEST_VERSION, DECK_MEDIA_TYPE};
use deckhand_core::models::{Deck, Slide, SlideBody};
use deckhand_core::AppError;
use serde::{Deserialize, Serialize};
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime, ZipArchive};

const MIMETYPE_ENTRY: &str = "mimetype";
const MANIFEST_ENTRY: &str = "deck.json";
const MEDIA_PREFIX: &str = "media/";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    slides: Vec<Slide>,
}

/// Produce the on-disk package for a deck.
pub fn serialize(deck: &Deck) -> Result<Vec<u8>, AppError> {
    let manifest = Manifest {
        version: DECK_MANIFEST_VERSION,
        slides: deck.slides.clone(),
    };
    let manifest_json = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| AppError::Internal(format!("Failed to encode deck manifest: {}", e)))?;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
        // Fixed timestamps and permissions keep serialization deterministic.
        let stored = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);
        let deflated = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        write_entry(&mut zip, MIMETYPE_ENTRY, DECK_MEDIA_TYPE.as_bytes(), stored)?;
        write_entry(&mut zip, MANIFEST_ENTRY, &manifest_json, deflated)?;

        for slide in &deck.slides {
            if let SlideBody::Image { image } = &slide.body {
                write_entry(&mut zip, &image.entry_name, &image.data, deflated)?;
            }
        }

        zip.finish()
            .map_err(|e| AppError::Internal(format!("Failed to finalize deck package: {}", e)))?;
    }

    Ok(buffer)
}

fn write_entry(
    zip: &mut ZipWriter<Cursor<&mut Vec<u8>>>,
    name: &str,
    data: &[u8],
    options: FileOptions,
) -> Result<(), AppError> {
    zip.start_file(name, options)
        .map_err(|e| AppError::Internal(format!("Failed to add package entry {}: {}", name, e)))?;
    zip.write_all(data)
        .map_err(|e| AppError::Internal(format!("Failed to write package entry {}: {}", name, e)))?;
    Ok(())
}

/// Parse a stored package back into a deck.
///
/// Any malformed container, missing or unparsable manifest, unsupported
/// manifest version, or missing media entry fails with `CorruptDocument`.
pub fn load(bytes: &[u8]) -> Result<Deck, AppError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::CorruptDocument(format!("not a deck package: {}", e)))?;

    let manifest: Manifest = {
        let mut entry = archive
            .by_name(MANIFEST_ENTRY)
            .map_err(|_| AppError::CorruptDocument("missing deck manifest".to_string()))?;
        let mut json = String::new();
        entry
            .read_to_string(&mut json)
            .map_err(|e| AppError::CorruptDocument(format!("unreadable deck manifest: {}", e)))?;
        serde_json::from_str(&json)
            .map_err(|e| AppError::CorruptDocument(format!("manifest parsing error: {}", e)))?
    };

    if manifest.version != DECK_MANIFEST_VERSION {
        return Err(AppError::CorruptDocument(format!(
            "unsupported manifest version {}",
            manifest.version
        )));
    }

    let mut deck = Deck {
        slides: manifest.slides,
    };

    for slide in &mut deck.slides {
        if let SlideBody::Image { image } = &mut slide.body {
            if !image.entry_name.starts_with(MEDIA_PREFIX) || image.entry_name.contains("..") {
                return Err(AppError::CorruptDocument(format!(
                    "invalid media entry name {}",
                    image.entry_name
                )));
            }
            let mut entry = archive.by_name(&image.entry_name).map_err(|_| {
                AppError::CorruptDocument(format!("missing media entry {}", image.entry_name))
            })?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(|e| {
                AppError::CorruptDocument(format!(
                    "unreadable media entry {}: {}",
                    image.entry_name, e
                ))
            })?;
            image.data = Bytes::from(data);
        }
    }

    Ok(deck)
}
