use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use undotree_core::SyncError;

#[derive(Debug)]
pub enum Error {
    BadRequest(String),
    NotFound(String),
    /// The request is well-formed but the graph cannot honour it.
    Conflict(String),
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": {
                "message": error_message
            }
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(err: JsonRejection) -> Self {
        Error::BadRequest(err.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(err: QueryRejection) -> Self {
        Error::BadRequest(err.body_text())
    }
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::UnknownNode(id) => Error::NotFound(format!("Node {} does not exist", id)),
            SyncError::PatchMismatch(msg) => Error::Conflict(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}
