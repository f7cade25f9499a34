//! Error types for mirror and prune operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while mirroring or pruning.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network failure or non-success HTTP status.
    #[error("transport error for {url}: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// The list envelope could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A remote path does not split into a name and a sequence ID.
    #[error("malformed path {path:?}: {reason}")]
    MalformedPath {
        /// The offending path.
        path: String,
        /// Why decomposition failed.
        reason: String,
    },

    /// A reply identifier is not usable as a single directory name.
    #[error("invalid reply id {reply_id:?}")]
    InvalidReplyId {
        /// The offending reply identifier.
        reply_id: String,
    },

    /// Directory creation or file write failed.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    /// Creates a transport error for `url`.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed path error.
    pub fn malformed_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a storage error for `path`.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
