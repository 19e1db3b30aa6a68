use thiserror::Error;

use super::path::FilenameError;

/// Errors that can occur during media storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested file was not found.
    #[error("media not found: {0}")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The media path is malformed or escapes the store root.
    #[error("invalid media path: {0}")]
    InvalidPath(String),

    #[error("invalid filename: {}", .0.message())]
    InvalidFilename(FilenameError),

    /// The file exceeds the configured size limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl From<FilenameError> for StorageError {
    fn from(err: FilenameError) -> Self {
        Self::InvalidFilename(err)
    }
}
