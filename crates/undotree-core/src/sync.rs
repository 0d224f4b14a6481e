//! Pull/apply/acknowledge cycle for one tracked file.
//!
//! Changes in a batch are applied in the order received, each against the
//! content the previous one produced. Nothing is committed or written to the
//! editor until the whole batch has been processed.

use crate::error::{Result, SyncError};
use crate::patch::{apply_delta, revert_delta};
use crate::tracker::{FileTracker, TrackingPhase};
use tracing::{debug, info, warn};
use undotree_http::{Change, ChangeMode, Delta};

/// What a single [`FileTracker::pull`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PullOutcome {
    /// Node ids applied (or found already applied), in delivery order.
    pub applied: Vec<String>,
    /// Node ids skipped for an unknown mode or a patch mismatch.
    pub skipped: Vec<String>,
    pub content_changed: bool,
    pub acknowledged: bool,
    /// Local edits were pending, so nothing was applied.
    pub deferred: bool,
}

impl PullOutcome {
    fn deferred() -> Self {
        PullOutcome {
            deferred: true,
            ..Default::default()
        }
    }
}

/// Result of applying one change to a content/position pair.
#[derive(Debug, PartialEq, Eq)]
pub enum ChangeOutcome {
    Applied,
    /// Redelivery of a change the content already reflects.
    AlreadyApplied,
}

/// Apply `change` to `content`, moving `current_node_id` to the change's node.
///
/// Leaves both untouched on error. A mismatch whose opposite direction fits
/// the content is treated as a redelivery of a change already applied.
pub fn apply_change(
    content: &mut String,
    current_node_id: &mut Option<String>,
    change: &Change,
) -> Result<ChangeOutcome> {
    if let ChangeMode::Unknown(mode) = &change.mode {
        return Err(SyncError::UnrecognizedMode(mode.clone()));
    }

    if matches!(change.delta, Delta::Patch(_))
        && current_node_id.as_deref() == Some(change.node_id.as_str())
    {
        return Ok(ChangeOutcome::AlreadyApplied);
    }

    let backwards = change.mode == ChangeMode::Revert;
    let step = |reverse: bool, base: &str| {
        if reverse {
            revert_delta(&change.delta, base)
        } else {
            apply_delta(&change.delta, base)
        }
    };

    match step(backwards, content.as_str()) {
        Ok(next) => {
            *content = next;
            *current_node_id = Some(change.node_id.clone());
            Ok(ChangeOutcome::Applied)
        }
        Err(SyncError::PatchMismatch(reason)) => {
            if matches!(change.delta, Delta::Patch(_)) && step(!backwards, content.as_str()).is_ok() {
                *current_node_id = Some(change.node_id.clone());
                Ok(ChangeOutcome::AlreadyApplied)
            } else {
                Err(SyncError::PatchMismatch(reason))
            }
        }
        Err(e) => Err(e),
    }
}

impl FileTracker {
    /// Poll the authority for `file_id`, apply what it sends and acknowledge.
    ///
    /// Deferred while local edits are waiting to be pushed: the diff base
    /// must not move underneath them. Skipped changes are left out of the
    /// acknowledgment so the authority can detect the gap and resync.
    pub async fn pull(&self, file_id: &str) -> Result<PullOutcome> {
        let entry = self
            .entry(file_id)
            .ok_or_else(|| SyncError::NotTracked(file_id.to_string()))?;
        {
            let state = entry.lock();
            if state.phase != TrackingPhase::Tracking || state.has_unsent_edits() {
                return Ok(PullOutcome::deferred());
            }
        }

        let changes = self.remote().poll_changes(file_id).await?;
        if changes.is_empty() {
            return Ok(PullOutcome::default());
        }
        debug!("[Sync] {} change(s) for {}", changes.len(), file_id);

        let mut outcome = PullOutcome::default();
        let (previous, updated) = {
            if !self.is_live(file_id, &entry) {
                return Err(SyncError::NotTracked(file_id.to_string()));
            }
            let mut state = entry.lock();
            if state.has_unsent_edits() {
                debug!("[Sync] Edits arrived while polling {}, deferring", file_id);
                return Ok(PullOutcome::deferred());
            }

            let mut content = state.content.clone();
            let mut current = state.current_node_id.clone();
            for change in &changes {
                match apply_change(&mut content, &mut current, change) {
                    Ok(ChangeOutcome::Applied) => {
                        debug!("[Sync] Applied {} ({}) to {}", change.node_id, change.mode, file_id);
                        outcome.applied.push(change.node_id.clone());
                    }
                    Ok(ChangeOutcome::AlreadyApplied) => {
                        debug!("[Sync] {} already applied to {}", change.node_id, file_id);
                        outcome.applied.push(change.node_id.clone());
                    }
                    Err(e) => {
                        warn!("[Sync] Skipping {} for {}: {}", change.node_id, file_id, e);
                        outcome.skipped.push(change.node_id.clone());
                    }
                }
            }

            let previous = (state.content.clone(), state.current_node_id.clone());
            outcome.content_changed = content != state.content;
            state.content = content.clone();
            state.current_node_id = current;
            (previous, content)
        };

        if outcome.content_changed {
            if let Err(e) = self.editor().replace_content(file_id, &updated).await {
                let mut state = entry.lock();
                if state.content == updated && !state.has_unsent_edits() {
                    state.content = previous.0;
                    state.current_node_id = previous.1;
                }
                warn!("[Sync] Editor rejected update for {}: {}", file_id, e);
                return Err(e);
            }
            info!("[Sync] Updated {} from {} remote change(s)", file_id, outcome.applied.len());
        }

        match self.remote().ack_changes(file_id, &outcome.applied).await {
            Ok(()) => outcome.acknowledged = true,
            Err(e) => warn!("[Sync] Acknowledgment for {} failed: {}", file_id, e),
        }

        Ok(outcome)
    }
}
