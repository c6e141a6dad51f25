//! Upload ingestion

mod service;

pub use service::{IngestedUpload, UploadIngestor};
