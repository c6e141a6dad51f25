//! Template catalog
//!
//! A fixed, read-only set of pre-built starter decks, loaded once at
//! process start from the configured template root. Template names are the
//! file stems of `*.deck` files in that directory. Creating a deck from a
//! template hands out a deep clone; catalog entries are never mutated.

use std::collections::HashMap;
use std::path::Path;

use deckhand_core::constants::DECK_FILE_EXTENSION;
use deckhand_core::models::Deck;
use deckhand_core::AppError;

use crate::package;

#[derive(Debug, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, Deck>,
}

impl TemplateCatalog {
    /// Load all `*.deck` files under `root`.
    ///
    /// A missing directory yields an empty catalog; entries that fail to
    /// parse are logged and skipped so one bad file cannot take the whole
    /// catalog down.
    pub fn load_dir(root: &Path) -> Result<Self, AppError> {
        let mut templates = HashMap::new();

        if !root.is_dir() {
            tracing::warn!(
                path = %root.display(),
                "Template root does not exist; starting with an empty catalog"
            );
            return Ok(Self { templates });
        }

        for entry in std::fs::read_dir(root)
            .map_err(|e| AppError::Io(format!("Failed to read template root: {}", e)))?
        {
            let path = entry
                .map_err(|e| AppError::Io(format!("Failed to read template root: {}", e)))?
                .path();

            if path.extension().and_then(|e| e.to_str()) != Some(DECK_FILE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let bytes = match std::fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable template");
                    continue;
                }
            };

            match package::load(&bytes) {
                Ok(deck) => {
                    tracing::info!(
                        template = %name,
                        slide_count = deck.slide_count(),
                        "Loaded template"
                    );
                    templates.insert(name.to_string(), deck);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unparsable template");
                }
            }
        }

        Ok(Self { templates })
    }

    pub fn get(&self, name: &str) -> Option<&Deck> {
        self.templates.get(name)
    }

    /// Template names, sorted for stable menu rendering.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
