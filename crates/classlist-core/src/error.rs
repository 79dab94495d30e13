//! Error types for the class list writer.
//!
//! Load and unload notifications never surface these to the runtime; the
//! writer logs them and disables itself instead. They are returned from the
//! setup path, the sink, and the manifest reader, where callers can act on them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the class list writer.
#[derive(Debug, Error)]
pub enum ClassListError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Class list sink is closed")]
    SinkClosed,

    // Concurrency errors
    #[error("Class list lock poisoned by a panicking thread")]
    LockPoisoned,

    // Manifest reader errors
    #[error("Malformed manifest line {line}: {message}")]
    MalformedLine { line: usize, message: String },

    #[error("Manifest out of order at record {record}: {message}")]
    OutOfOrder { record: usize, message: String },
}

/// Result type alias for class list operations.
pub type Result<T> = std::result::Result<T, ClassListError>;

impl From<std::io::Error> for ClassListError {
    fn from(err: std::io::Error) -> Self {
        ClassListError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl ClassListError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ClassListError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Whether this error came from the manifest file itself rather than
    /// from the contents being read or written.
    pub fn is_io(&self) -> bool {
        matches!(self, ClassListError::Io { .. } | ClassListError::SinkClosed)
    }
}
