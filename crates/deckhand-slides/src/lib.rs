//! Deckhand Slide Assembly
//!
//! Pure operations over the in-memory deck representation: creating a deck
//! (blank or from a template), appending slides, and converting between a
//! deck and its on-disk package format. Nothing in this crate performs
//! network or session I/O; the only filesystem access is reading referenced
//! image files and the template catalog at startup.

pub mod assembler;
pub mod package;
pub mod template;

pub use assembler::{add_content_slide, add_image_slide, add_title_slide, create};
pub use package::{load, serialize};
pub use template::TemplateCatalog;
