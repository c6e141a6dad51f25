//! Input validation helpers for untrusted upload metadata

use crate::error::AppError;

const MAX_FILENAME_LENGTH: usize = 255;

/// Sanitize a client-declared filename to prevent path traversal and
/// invalid characters. Returns an error if the filename contains a path
/// traversal attempt.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    // Checked on the raw input: extracting the final path component first
    // would silently swallow `foo/../bar`.
    if filename.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let path = std::path::Path::new(filename);
    let filename_only = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() || sanitized.len() < 3 {
        return Ok("file".to_string());
    }

    Ok(sanitized)
}

/// Sanitize an opaque identifier for use as one storage-key path component.
/// Unlike filenames, identifiers are never rejected; anything unsafe is
/// replaced.
pub fn sanitize_key_component(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// Validate a declared upload size against the configured ceiling. Checked
/// before any byte of the stream is read.
pub fn validate_declared_size(declared_size: u64, max_size: u64) -> Result<(), AppError> {
    if declared_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}
