//! # Media Error Types

use thiserror::Error;

/// Errors from blob storage and image processing.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Filesystem read/write failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes are not a readable image.
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: String, reason: String },

    /// Re-encoding the processed image failed.
    #[error("Failed to encode image {path}: {reason}")]
    Encode { path: String, reason: String },

    /// The path's extension names no format the codec can write.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// No blob stored under the path.
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// The blob path is absolute or escapes the store root.
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;
