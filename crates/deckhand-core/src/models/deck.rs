//! Deck and slide models
//!
//! A `Deck` is the in-progress slide collection a session owns. Slides are
//! created only through the assembler operations in `deckhand-slides` and
//! are never mutated in place once appended; edits append new slides or
//! replace the whole deck.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BULLET_FONT_PT, DEFAULT_IMAGE_OFFSET_IN};

/// Ordered slide collection. Insertion order is significant.
///
/// A freshly created deck has zero slides; that is a legal, distinct state
/// from a session holding no deck at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub slides: Vec<Slide>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Titles in slide order.
    pub fn titles(&self) -> Vec<&str> {
        self.slides.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn push(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Number of image slides currently in the deck. Used to derive unique
    /// media entry names when embedding images.
    pub fn image_slide_count(&self) -> usize {
        self.slides
            .iter()
            .filter(|s| matches!(s.body, SlideBody::Image { .. }))
            .count()
    }
}

/// One unit of the deck: a required title plus a layout-specific body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(flatten)]
    pub body: SlideBody,
}

impl Slide {
    pub fn layout_kind(&self) -> LayoutKind {
        match self.body {
            SlideBody::Title { .. } => LayoutKind::Title,
            SlideBody::Content { .. } => LayoutKind::Content,
            SlideBody::Image { .. } => LayoutKind::Image,
        }
    }
}

/// Layout-tagged slide body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SlideBody {
    Title {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subtitle: Option<String>,
    },
    Content {
        bullets: Vec<Bullet>,
    },
    Image {
        image: ImageResource,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Title,
    Content,
    Image,
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutKind::Title => write!(f, "title"),
            LayoutKind::Content => write!(f, "content"),
            LayoutKind::Image => write!(f, "image"),
        }
    }
}

/// One bullet paragraph on a content slide, independently sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub text: String,
    pub font_size_pt: u16,
}

impl Bullet {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size_pt: DEFAULT_BULLET_FONT_PT,
        }
    }
}

/// An image embedded in the deck package.
///
/// `entry_name` is the package entry the pixel data is stored under; the
/// bytes themselves are not part of the JSON manifest and are reattached
/// when the package is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResource {
    pub entry_name: String,
    pub offset_in: f32,
    #[serde(skip)]
    pub data: Bytes,
}

impl ImageResource {
    pub fn new(entry_name: impl Into<String>, data: Bytes) -> Self {
        Self {
            entry_name: entry_name.into(),
            offset_in: DEFAULT_IMAGE_OFFSET_IN,
            data,
        }
    }
}
