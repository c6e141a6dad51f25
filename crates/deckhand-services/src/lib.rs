//! Deckhand Services Layer
//!
//! This crate is the **session service layer**: it hosts the upload
//! ingestion pipeline, the per-user session store, the session state
//! machine (the boundary a chat gateway invokes), and the background
//! cleanup service. Keep coordination and session policy here; keep thin
//! transport handling in the gateway binary.

pub mod cleanup;
pub mod ingest;
pub mod session;

pub use cleanup::CleanupService;
pub use ingest::{IngestedUpload, UploadIngestor};
pub use session::{
    EditCommand, Menu, MenuOption, SessionEvent, SessionReply, SessionStateMachine, SessionStore,
};
