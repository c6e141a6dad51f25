//! Deckhand Core Library
//!
//! This crate provides the domain models, error types, configuration, and
//! input validation shared across all Deckhand components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, LogLevel, ReplyMetadata};
pub use models::{
    Bullet, Deck, ImageResource, LayoutKind, Session, SessionState, Slide, SlideBody,
    UploadedArtifact, UserId,
};
