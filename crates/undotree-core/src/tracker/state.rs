use super::debouncer::Debounce;
use crate::graph::EditGraph;

/// Lifecycle of a tracked file. Files with no entry are untracked/closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingPhase {
    /// Waiting for the authority to register the initial snapshot.
    Initializing,
    Tracking,
}

/// Per-file state. Only the tracker touches it, always under its lock.
#[derive(Debug)]
pub(crate) struct FileState {
    pub(crate) file_id: String,
    pub(crate) phase: TrackingPhase,
    /// Last text known to match both the editor and `current_node_id`.
    pub(crate) content: String,
    pub(crate) current_node_id: Option<String>,
    /// Latest editor text not yet diffed and pushed.
    pub(crate) pending_content: Option<String>,
    pub(crate) debounce: Debounce,
    pub(crate) push_in_flight: bool,
    /// Nodes this client created.
    pub(crate) graph: EditGraph,
}

impl FileState {
    pub(crate) fn new(file_id: &str, content: String) -> Self {
        FileState {
            file_id: file_id.to_string(),
            phase: TrackingPhase::Initializing,
            content,
            current_node_id: None,
            pending_content: None,
            debounce: Debounce::default(),
            push_in_flight: false,
            graph: EditGraph::new(file_id),
        }
    }

    /// Local edits exist that the authority has not seen yet.
    pub(crate) fn has_unsent_edits(&self) -> bool {
        self.push_in_flight
            || self
                .pending_content
                .as_ref()
                .is_some_and(|p| *p != self.content)
    }

    pub(crate) fn snapshot(&self) -> FileSnapshot {
        FileSnapshot {
            file_id: self.file_id.clone(),
            phase: self.phase,
            content: self.content.clone(),
            current_node_id: self.current_node_id.clone(),
            pending_content: self.pending_content.clone(),
            push_in_flight: self.push_in_flight,
            debounce_scheduled: self.debounce.is_scheduled(),
        }
    }
}

/// A read-only copy of a file's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSnapshot {
    pub file_id: String,
    pub phase: TrackingPhase,
    pub content: String,
    pub current_node_id: Option<String>,
    pub pending_content: Option<String>,
    pub push_in_flight: bool,
    pub debounce_scheduled: bool,
}
