//! Error types module
//!
//! This module provides the core error types used throughout the Deckhand
//! application. All errors are unified under the `AppError` enum, which can
//! represent upload, document, template, and session-specific errors.
//!
//! Every variant a user can trigger is recoverable: the session machine
//! converts it into a chat reply and leaves the session in its last
//! well-defined state. Only `Io` and `Internal` represent faults the user
//! cannot fix by re-sending a command.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error replies - defines how an error should be presented
/// over the chat boundary. The gateway renders `user_message` verbatim.
pub trait ReplyMetadata {
    /// Machine-readable error code (e.g., "CORRUPT_DOCUMENT")
    fn error_code(&self) -> &'static str;

    /// Whether the triggering command can simply be re-sent
    fn is_recoverable(&self) -> bool;

    /// User-facing message (may differ from the internal error message)
    fn user_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Another operation is already in progress for this user")]
    Busy,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

// Error conversion implementations following Rust best practices
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::CorruptDocument(format!("manifest parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, log_level).
/// `user_message` stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, LogLevel) {
    match err {
        AppError::PayloadTooLarge(_) => ("PAYLOAD_TOO_LARGE", true, LogLevel::Warn),
        AppError::CorruptDocument(_) => ("CORRUPT_DOCUMENT", true, LogLevel::Warn),
        AppError::TemplateNotFound(_) => ("TEMPLATE_NOT_FOUND", true, LogLevel::Debug),
        AppError::ResourceNotFound(_) => ("RESOURCE_NOT_FOUND", true, LogLevel::Debug),
        AppError::InvalidInput(_) => ("INVALID_INPUT", true, LogLevel::Debug),
        AppError::Busy => ("BUSY", true, LogLevel::Debug),
        AppError::Io(_) => ("IO_ERROR", false, LogLevel::Error),
        AppError::Internal(_) => ("INTERNAL_ERROR", false, LogLevel::Error),
        AppError::InternalWithSource { .. } => ("INTERNAL_ERROR", false, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error reporting
    pub fn error_type(&self) -> &str {
        match self {
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::CorruptDocument(_) => "CorruptDocument",
            AppError::TemplateNotFound(_) => "TemplateNotFound",
            AppError::ResourceNotFound(_) => "ResourceNotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Busy => "Busy",
            AppError::Io(_) => "Io",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including the error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ReplyMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).2
    }

    fn user_message(&self) -> String {
        match self {
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::CorruptDocument(_) => {
                "That file does not look like a valid presentation. Please try another file."
                    .to_string()
            }
            AppError::TemplateNotFound(ref name) => {
                format!("No template named \"{}\" is available.", name)
            }
            AppError::ResourceNotFound(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::Busy => {
                "A previous command is still being processed. Please wait a moment and try again."
                    .to_string()
            }
            AppError::Io(_) => "An error occurred while processing your request.".to_string(),
            AppError::Internal(_) => "An error occurred while processing your request.".to_string(),
            AppError::InternalWithSource { .. } => {
                "An error occurred while processing your request.".to_string()
            }
        }
    }
}
