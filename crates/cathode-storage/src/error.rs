//! Storage error types for cathode-storage.
//!
//! [`StorageError`] separates genuine I/O failures from malformed side-table
//! content. Readers downgrade malformed content to "no data" (see
//! [`StorageError::is_malformed`]); writers surface every error.

use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors produced by side-table operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the archive failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored string was not valid UTF-8.
    #[error("invalid UTF-8 in stored string: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),

    /// The side table contains values that cannot be decoded.
    #[error("malformed side table: {reason}")]
    Malformed { reason: String },

    /// An offset or count does not fit the 32-bit on-disk fields.
    #[error("side table too large: {size} exceeds the 32-bit format limit")]
    TableTooLarge { size: u64 },

    /// Replacing the archive with the rewritten copy failed.
    #[error("failed to replace archive: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl StorageError {
    /// Returns `true` for errors caused by bad table content rather than the
    /// file system. A truncated payload counts as bad content.
    pub fn is_malformed(&self) -> bool {
        match self {
            StorageError::Malformed { .. } | StorageError::InvalidUtf8(_) => true,
            StorageError::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        StorageError::Malformed {
            reason: reason.into(),
        }
    }
}
