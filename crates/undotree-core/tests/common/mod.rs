#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use undotree_core::{EditorBuffer, FileTracker, SyncError};
use undotree_http::{Change, GraphError, GraphRemote, GraphView, NewNode};

pub const DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Default)]
struct RemoteState {
    next_id: usize,
    pushes: Vec<NewNode>,
    acks: Vec<(String, Vec<String>)>,
    queued: HashMap<String, Vec<Change>>,
    polls: usize,
    fail_fetch: bool,
    fail_push: bool,
    fail_ack: bool,
    failing_polls: HashSet<String>,
    push_delay: Option<Duration>,
    graph: GraphView,
}

/// In-memory authority that hands out `n1`, `n2`, ... and records traffic.
#[derive(Default)]
pub struct MockRemote {
    state: Mutex<RemoteState>,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn pushes(&self) -> Vec<NewNode> {
        self.state.lock().pushes.clone()
    }

    pub fn acks(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().acks.clone()
    }

    pub fn polls(&self) -> usize {
        self.state.lock().polls
    }

    pub fn queue(&self, file_id: &str, changes: Vec<Change>) {
        self.state
            .lock()
            .queued
            .entry(file_id.to_string())
            .or_default()
            .extend(changes);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.state.lock().fail_fetch = fail;
    }

    pub fn fail_push(&self, fail: bool) {
        self.state.lock().fail_push = fail;
    }

    pub fn fail_ack(&self, fail: bool) {
        self.state.lock().fail_ack = fail;
    }

    pub fn fail_polls_for(&self, file_id: &str) {
        self.state.lock().failing_polls.insert(file_id.to_string());
    }

    /// Listing returned by every `fetch_graph`.
    pub fn set_graph(&self, view: GraphView) {
        self.state.lock().graph = view;
    }

    pub fn delay_pushes(&self, delay: Duration) {
        self.state.lock().push_delay = Some(delay);
    }
}

#[async_trait]
impl GraphRemote for MockRemote {
    async fn fetch_graph(&self, _file_id: &str) -> undotree_http::Result<GraphView> {
        let state = self.state.lock();
        if state.fail_fetch {
            return Err(GraphError::Unavailable("connection refused".into()));
        }
        Ok(state.graph.clone())
    }

    async fn push_node(&self, node: &NewNode) -> undotree_http::Result<String> {
        let delay = self.state.lock().push_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock();
        if state.fail_push {
            return Err(GraphError::Rejected {
                status: 500,
                body: "internal error".into(),
            });
        }
        state.next_id += 1;
        state.pushes.push(node.clone());
        Ok(format!("n{}", state.next_id))
    }

    async fn poll_changes(&self, file_id: &str) -> undotree_http::Result<Vec<Change>> {
        let mut state = self.state.lock();
        state.polls += 1;
        if state.failing_polls.contains(file_id) {
            return Err(GraphError::Unavailable("poll timed out".into()));
        }
        Ok(state.queued.remove(file_id).unwrap_or_default())
    }

    async fn ack_changes(&self, file_id: &str, node_ids: &[String]) -> undotree_http::Result<()> {
        let mut state = self.state.lock();
        if state.fail_ack {
            return Err(GraphError::Unavailable("ack dropped".into()));
        }
        state.acks.push((file_id.to_string(), node_ids.to_vec()));
        Ok(())
    }
}

/// Editor that remembers every buffer replacement.
#[derive(Default)]
pub struct RecordingEditor {
    writes: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl RecordingEditor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().clone()
    }

    pub fn fail(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl EditorBuffer for RecordingEditor {
    async fn replace_content(&self, file_id: &str, content: &str) -> undotree_core::Result<()> {
        if *self.fail.lock() {
            return Err(SyncError::Io(std::io::Error::other("buffer is read-only")));
        }
        self.writes
            .lock()
            .push((file_id.to_string(), content.to_string()));
        Ok(())
    }
}

pub fn tracker(remote: &Arc<MockRemote>, editor: &Arc<RecordingEditor>) -> FileTracker {
    FileTracker::new(remote.clone(), editor.clone(), DEBOUNCE)
}
