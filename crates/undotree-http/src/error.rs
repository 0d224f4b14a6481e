//! Error types for graph authority operations.

use thiserror::Error;

/// Result type for graph authority operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur while talking to the graph authority.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GraphError {
    /// The request never produced a response (connect, DNS, timeout).
    #[error("Graph authority unavailable: {0}")]
    Unavailable(String),

    /// The authority answered with a status other than the expected one.
    #[error("Graph authority rejected request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Response decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphError {
    /// Transport-level failures, as opposed to an explicit answer from the authority.
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, GraphError::Unavailable(_))
    }

    /// HTTP status carried by a rejection, if any.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_carries_status() {
        let err = GraphError::Rejected {
            status: 404,
            body: "missing parent".into(),
        };
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_unavailable());
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_unavailable_has_no_status() {
        let err = GraphError::Unavailable("connection refused".into());
        assert!(err.is_unavailable());
        assert_eq!(err.status(), None);
    }
}
