//! Patch codec: compute, apply and invert edit scripts.
//!
//! The [`Patch`] type itself lives in `undotree-http` so it can travel on the
//! wire; this module holds the algorithms over it.

mod apply;
mod diff;
mod invert;

pub use apply::apply;
pub use diff::diff;
pub use invert::invert;

use crate::error::{Result, SyncError};
use undotree_http::{Delta, Patch};

/// Reconstruct the child's content from its parent's.
///
/// A snapshot payload replaces `base` outright.
pub fn apply_delta(delta: &Delta, base: &str) -> Result<String> {
    match delta {
        Delta::Snapshot(snapshot) => Ok(snapshot.clone()),
        Delta::Patch(patch) => apply(patch, base),
    }
}

/// Step from a node's content back to its parent's.
///
/// Reverting a snapshot returns to the root sentinel, whose content is empty,
/// and is only valid while `current` still holds that snapshot.
pub fn revert_delta(delta: &Delta, current: &str) -> Result<String> {
    match delta {
        Delta::Snapshot(snapshot) if snapshot == current => Ok(String::new()),
        Delta::Snapshot(_) => Err(SyncError::PatchMismatch(
            "content no longer matches the snapshot being reverted".into(),
        )),
        Delta::Patch(patch) => apply(&invert(patch), current),
    }
}

/// Canonical byte encoding of a patch. See [`Patch::encode`].
pub fn encode(patch: &Patch) -> Result<Vec<u8>> {
    Ok(patch.encode()?)
}

pub fn decode(bytes: &[u8]) -> Result<Patch> {
    Ok(Patch::decode(bytes)?)
}
