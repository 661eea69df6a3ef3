use thiserror::Error;

/// Errors that abort a validation request outright. Per-row problems are
/// reported in the summary instead, never through this type.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Unsupported date format: {0}")]
    UnsupportedDateFormat(String),
    #[error("Invalid column mapping: {0}")]
    InvalidMapping(String),
}
