//! Pending changes delivered by the authority, and the requests that drive them.

use crate::types::Delta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction in which a delivered delta must be applied.
///
/// Unknown strings survive deserialization so one odd entry cannot fail a
/// whole poll.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChangeMode {
    /// Advance: apply the forward delta.
    Apply,
    /// Step back: apply the inverse of the forward delta.
    Revert,
    Unknown(String),
}

impl ChangeMode {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ChangeMode::Apply => "apply",
            ChangeMode::Revert => "revert",
            ChangeMode::Unknown(s) => s,
        }
    }
}

impl From<String> for ChangeMode {
    fn from(s: String) -> Self {
        match s.as_str() {
            "apply" => ChangeMode::Apply,
            "revert" => ChangeMode::Revert,
            _ => ChangeMode::Unknown(s),
        }
    }
}

impl From<ChangeMode> for String {
    fn from(mode: ChangeMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `GET /api/poll_changes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub node_id: String,
    pub delta: Delta,
    pub mode: ChangeMode,
}

/// Body of `POST /api/ack_changes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRequest {
    pub file_id: String,
    #[serde(default)]
    pub node_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub message: String,
    pub remaining_pending_count: usize,
}

/// Body of `POST /api/navigate`, sent by the tree browser.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub file_id: String,
    pub current_node_id: String,
    #[serde(default)]
    pub target_node_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigateResponse {
    pub message: String,
    pub mode: ChangeMode,
}
