//! Unified error types for uishot

use thiserror::Error;

/// Unified error type for all uishot operations
#[derive(Error, Debug)]
pub enum UishotError {
    // Browser errors
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    // Pipeline errors
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Image encoding failed: {0}")]
    Encoding(String),

    // Input errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Result type alias using UishotError
pub type Result<T> = std::result::Result<T, UishotError>;
