//! Node payloads as they travel on the wire.

use crate::types::Patch;
use serde::{Deserialize, Serialize};

/// A node's payload: a full snapshot or a patch against the parent.
///
/// Serialized untagged: a JSON string is a snapshot, a JSON array a patch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Delta {
    Snapshot(String),
    Patch(Patch),
}

impl Delta {
    #[inline]
    #[must_use]
    pub fn is_full_content(&self) -> bool {
        matches!(self, Delta::Snapshot(_))
    }

    #[must_use]
    pub fn as_patch(&self) -> Option<&Patch> {
        match self {
            Delta::Patch(p) => Some(p),
            Delta::Snapshot(_) => None,
        }
    }

    #[must_use]
    pub fn as_snapshot(&self) -> Option<&str> {
        match self {
            Delta::Snapshot(s) => Some(s),
            Delta::Patch(_) => None,
        }
    }
}

impl From<Patch> for Delta {
    fn from(patch: Patch) -> Self {
        Delta::Patch(patch)
    }
}

impl From<String> for Delta {
    fn from(snapshot: String) -> Self {
        Delta::Snapshot(snapshot)
    }
}
