//! Deck mutation operations
//!
//! Every operation validates all of its inputs before touching deck state,
//! so a typed failure always leaves the deck exactly as it was. The deck is
//! exclusively owned by its session, which is why in-place mutation is
//! safe: no other owner can observe the intermediate value.

use std::path::Path;

use bytes::Bytes;
use deckhand_core::models::{Bullet, Deck, ImageResource, Slide, SlideBody};
use deckhand_core::AppError;

use crate::template::TemplateCatalog;

/// Create a new deck, optionally instantiated from a named template.
///
/// The returned deck is freshly allocated and shares no mutable state with
/// the catalog entry.
pub fn create(catalog: &TemplateCatalog, template: Option<&str>) -> Result<Deck, AppError> {
    match template {
        Some(name) => catalog
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::TemplateNotFound(name.to_string())),
        None => Ok(Deck::new()),
    }
}

/// Append a title slide with an optional subtitle.
pub fn add_title_slide(
    deck: &mut Deck,
    title: &str,
    subtitle: Option<&str>,
) -> Result<(), AppError> {
    let title = validate_title(title)?;

    deck.push(Slide {
        title,
        body: SlideBody::Title {
            subtitle: subtitle
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        },
    });
    Ok(())
}

/// Append a content slide with one bullet paragraph per entry, each at the
/// default font size. An empty bullet list is legal (title-only slide).
pub fn add_content_slide(deck: &mut Deck, title: &str, bullets: &[String]) -> Result<(), AppError> {
    let title = validate_title(title)?;

    deck.push(Slide {
        title,
        body: SlideBody::Content {
            bullets: bullets.iter().map(Bullet::new).collect(),
        },
    });
    Ok(())
}

/// Append an image slide placing the picture at the default offset.
///
/// The file at `image_path` is read and sniffed up front; anything missing,
/// unreadable, or not decodable as an image fails with `ResourceNotFound`
/// before the deck is touched. The bytes are embedded in the deck so the
/// slide stays valid after the source file goes away.
pub fn add_image_slide(deck: &mut Deck, title: &str, image_path: &Path) -> Result<(), AppError> {
    let title = validate_title(title)?;

    let data = std::fs::read(image_path).map_err(|_| {
        AppError::ResourceNotFound(format!("Image not found at {}", image_path.display()))
    })?;

    let format = image::guess_format(&data).map_err(|_| {
        AppError::ResourceNotFound(format!(
            "File at {} is not a readable image",
            image_path.display()
        ))
    })?;

    let extension = format.extensions_str().first().copied().unwrap_or("bin");
    let entry_name = format!("media/image{}.{}", deck.image_slide_count() + 1, extension);

    deck.push(Slide {
        title,
        body: SlideBody::Image {
            image: ImageResource::new(entry_name, Bytes::from(data)),
        },
    });
    Ok(())
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(
            "Slide title must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
