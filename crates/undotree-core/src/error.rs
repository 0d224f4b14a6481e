//! Error types for the sync engine.

use std::io;
use thiserror::Error;
use undotree_http::GraphError;

/// Result type for sync engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while tracking and synchronizing a file.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    /// Transport failure reaching the authority.
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The authority answered with a non-success status.
    #[error("Remote rejected request: HTTP {status}: {body}")]
    RemoteRejected { status: u16, body: String },

    /// A patch's expected base does not match the content it was applied to.
    #[error("Patch mismatch: {0}")]
    PatchMismatch(String),

    #[error("Unrecognized change mode: {0}")]
    UnrecognizedMode(String),

    #[error("Parent chain does not terminate at root: {0}")]
    Cycle(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("File is not tracked: {0}")]
    NotTracked(String),

    #[error("File is still initializing: {0}")]
    AlreadyInitializing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<GraphError> for SyncError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Unavailable(msg) => SyncError::RemoteUnavailable(msg),
            GraphError::Rejected { status, body } => SyncError::RemoteRejected { status, body },
            GraphError::Json(e) => SyncError::Json(e),
            other => SyncError::RemoteUnavailable(other.to_string()),
        }
    }
}

impl SyncError {
    /// Failures caused by the authority rather than local state.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteUnavailable(_) | SyncError::RemoteRejected { .. }
        )
    }

    #[inline]
    #[must_use]
    pub fn is_mismatch(&self) -> bool {
        matches!(self, SyncError::PatchMismatch(_))
    }
}
