//! Per-file tracking state machine.
//!
//! `Uninitialized -> Initializing -> Tracking -> Closed`. Untracked and closed
//! files simply have no entry in the tracker's map.
//!
//! Local edits are coalesced: each change notification overwrites the pending
//! text and restarts the debounce timer, so only the latest buffer is diffed
//! and pushed once the editor goes quiet.

mod debouncer;
mod state;

pub use state::{FileSnapshot, TrackingPhase};

pub(crate) use state::FileState;

use crate::config::Config;
use crate::editor::EditorBuffer;
use crate::error::{Result, SyncError};
use crate::graph::{EditGraph, Node, ParentRef};
use crate::patch::diff;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use undotree_http::{Delta, GraphRemote, GraphView, NewNode, ROOT_NODE_ID};

pub(crate) type SharedState = Arc<Mutex<FileState>>;

struct Inner {
    remote: Arc<dyn GraphRemote>,
    editor: Arc<dyn EditorBuffer>,
    debounce: Duration,
    files: RwLock<HashMap<String, SharedState>>,
}

/// Owns the state of every tracked file. Cheap to clone.
///
/// Locks are never held across an `.await`: network calls work on a copy of
/// the state and re-acquire the lock to commit.
#[derive(Clone)]
pub struct FileTracker {
    inner: Arc<Inner>,
}

impl FileTracker {
    pub fn new(
        remote: Arc<dyn GraphRemote>,
        editor: Arc<dyn EditorBuffer>,
        debounce: Duration,
    ) -> Self {
        FileTracker {
            inner: Arc::new(Inner {
                remote,
                editor,
                debounce,
                files: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn from_config(
        config: &Config,
        remote: Arc<dyn GraphRemote>,
        editor: Arc<dyn EditorBuffer>,
    ) -> Self {
        Self::new(remote, editor, config.debounce())
    }

    pub fn debounce(&self) -> Duration {
        self.inner.debounce
    }

    pub(crate) fn remote(&self) -> &Arc<dyn GraphRemote> {
        &self.inner.remote
    }

    pub(crate) fn editor(&self) -> &Arc<dyn EditorBuffer> {
        &self.inner.editor
    }

    pub(crate) fn entry(&self, file_id: &str) -> Option<SharedState> {
        self.inner.files.read().get(file_id).cloned()
    }

    /// True while `entry` is still the live state for `file_id`.
    pub(crate) fn is_live(&self, file_id: &str, entry: &SharedState) -> bool {
        self.inner
            .files
            .read()
            .get(file_id)
            .is_some_and(|live| Arc::ptr_eq(live, entry))
    }

    /// Ids of all files with state, sorted.
    pub fn tracked_files(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.files.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_tracked(&self, file_id: &str) -> bool {
        self.inner.files.read().contains_key(file_id)
    }

    pub fn snapshot(&self, file_id: &str) -> Option<FileSnapshot> {
        self.entry(file_id).map(|entry| entry.lock().snapshot())
    }

    /// Content at `node_id` rebuilt from the nodes this client created.
    pub fn reconstruct(&self, file_id: &str, node_id: &str) -> Result<String> {
        let entry = self
            .entry(file_id)
            .ok_or_else(|| SyncError::NotTracked(file_id.to_string()))?;
        let state = entry.lock();
        state.graph.reconstruct(node_id)
    }

    /// Start tracking `file_id` with `text` as its initial snapshot.
    ///
    /// Registers the graph and a full-content node under the root, and
    /// returns that node's id. The history the authority already holds is
    /// kept locally for [`FileTracker::reconstruct`]. On failure the file
    /// stays untracked.
    pub async fn enable(&self, file_id: &str, text: &str) -> Result<String> {
        let entry = {
            let mut files = self.inner.files.write();
            if let Some(existing) = files.get(file_id) {
                let state = existing.lock();
                return match (&state.phase, &state.current_node_id) {
                    (TrackingPhase::Tracking, Some(node_id)) => Ok(node_id.clone()),
                    _ => Err(SyncError::AlreadyInitializing(file_id.to_string())),
                };
            }
            let entry = Arc::new(Mutex::new(FileState::new(file_id, text.to_string())));
            files.insert(file_id.to_string(), entry.clone());
            entry
        };

        info!("[Tracker] Initializing {}", file_id);
        match self.register_initial(file_id, text).await {
            Ok((view, node_id)) => {
                if !self.is_live(file_id, &entry) {
                    debug!("[Tracker] {} closed during initialization", file_id);
                    return Err(SyncError::NotTracked(file_id.to_string()));
                }
                let history = EditGraph::from_view(file_id, &view).unwrap_or_else(|e| {
                    warn!("[Tracker] Ignoring unusable history for {}: {}", file_id, e);
                    EditGraph::new(file_id)
                });
                let mut state = entry.lock();
                state.graph = history;
                state.phase = TrackingPhase::Tracking;
                state.current_node_id = Some(node_id.clone());
                state.graph.insert(Node {
                    node_id: node_id.clone(),
                    parent: ParentRef::Root,
                    payload: Delta::Snapshot(text.to_string()),
                    file_id: file_id.to_string(),
                })?;
                if state.pending_content.is_some() {
                    self.schedule_flush(&mut state);
                }
                info!("[Tracker] Tracking {} at node {}", file_id, node_id);
                Ok(node_id)
            }
            Err(e) => {
                let mut files = self.inner.files.write();
                if files
                    .get(file_id)
                    .is_some_and(|live| Arc::ptr_eq(live, &entry))
                {
                    files.remove(file_id);
                }
                warn!("[Tracker] Failed to initialize {}: {}", file_id, e);
                Err(e)
            }
        }
    }

    async fn register_initial(&self, file_id: &str, text: &str) -> Result<(GraphView, String)> {
        let view = self.inner.remote.fetch_graph(file_id).await?;
        let node = NewNode::new(file_id, ROOT_NODE_ID, Delta::Snapshot(text.to_string()));
        let node_id = self.inner.remote.push_node(&node).await?;
        Ok((view, node_id))
    }

    /// Buffer-change notification carrying the full editor text.
    ///
    /// Last writer wins: the pending text is overwritten and the debounce
    /// restarted. Must be called from within a tokio runtime.
    pub fn on_edit(&self, file_id: &str, text: &str) {
        let Some(entry) = self.entry(file_id) else {
            debug!("[Tracker] Ignoring edit for untracked {}", file_id);
            return;
        };
        let mut state = entry.lock();
        state.pending_content = Some(text.to_string());
        if state.phase == TrackingPhase::Tracking {
            self.schedule_flush(&mut state);
        }
    }

    pub(crate) fn schedule_flush(&self, state: &mut FileState) {
        let tracker = self.clone();
        let file_id = state.file_id.clone();
        state.debounce.reschedule(self.inner.debounce, async move {
            if let Err(e) = tracker.flush(&file_id).await {
                warn!("[Tracker] Push for {} failed, retrying after debounce: {}", file_id, e);
            }
        });
    }

    /// Diff the pending text against `content` and push it.
    ///
    /// Returns the new node id, or `None` when there was nothing to send or
    /// the push was deferred behind one already in flight. On failure the
    /// state is left as it was and another flush is scheduled.
    pub async fn flush(&self, file_id: &str) -> Result<Option<String>> {
        let Some(entry) = self.entry(file_id) else {
            return Ok(None);
        };

        let (parent_id, patch, target) = {
            let mut state = entry.lock();
            state.debounce.detach();
            if state.phase != TrackingPhase::Tracking {
                return Ok(None);
            }
            if state.push_in_flight {
                debug!("[Tracker] Push in flight for {}, deferring", file_id);
                self.schedule_flush(&mut state);
                return Ok(None);
            }
            let Some(pending) = state.pending_content.clone() else {
                return Ok(None);
            };
            let patch = diff(&state.content, &pending);
            if patch.is_empty() {
                state.pending_content = None;
                return Ok(None);
            }
            let Some(parent_id) = state.current_node_id.clone() else {
                return Ok(None);
            };
            state.push_in_flight = true;
            (parent_id, patch, pending)
        };

        let node = NewNode::new(file_id, parent_id.clone(), Delta::Patch(patch));
        let result = self.inner.remote.push_node(&node).await;

        let live = self.is_live(file_id, &entry);
        let mut state = entry.lock();
        state.push_in_flight = false;
        if !live {
            debug!("[Tracker] {} closed during push, discarding result", file_id);
            return Ok(None);
        }

        let node_id = match result {
            Ok(node_id) => node_id,
            Err(e) => {
                self.schedule_flush(&mut state);
                return Err(e.into());
            }
        };
        state.content = target.clone();
        state.current_node_id = Some(node_id.clone());
        if let Err(e) = state.graph.insert(Node {
            node_id: node_id.clone(),
            parent: ParentRef::from_id(&parent_id),
            payload: node.delta,
            file_id: file_id.to_string(),
        }) {
            debug!("[Tracker] Not recording {} locally: {}", node_id, e);
        }

        match state.pending_content.as_deref() {
            Some(pending) if pending == target => state.pending_content = None,
            Some(_) => self.schedule_flush(&mut state),
            None => {}
        }

        info!("[Tracker] Pushed {} for {} (parent {})", node_id, file_id, parent_id);
        Ok(Some(node_id))
    }

    /// Stop tracking `file_id`. Unsent edits are dropped, not flushed.
    pub fn close(&self, file_id: &str) -> bool {
        let Some(entry) = self.inner.files.write().remove(file_id) else {
            return false;
        };
        let mut state = entry.lock();
        state.debounce.cancel();
        if state.has_unsent_edits() {
            info!("[Tracker] Closed {} with unsent edits discarded", file_id);
        } else {
            info!("[Tracker] Closed {}", file_id);
        }
        true
    }

    /// Close every tracked file.
    pub fn close_all(&self) {
        for file_id in self.tracked_files() {
            self.close(&file_id);
        }
    }
}
