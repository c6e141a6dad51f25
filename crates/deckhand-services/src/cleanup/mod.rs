//! Background cleanup

mod service;

pub use service::{CleanupService, CleanupSummary};
