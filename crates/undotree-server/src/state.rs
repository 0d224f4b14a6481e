//! In-memory graphs and pending-change queues, one per file.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use undotree_core::patch::apply_delta;
use undotree_core::{EditGraph, Node, ParentRef};
use undotree_http::{Change, ChangeMode, Delta, GraphView, ROOT_NODE_ID};

#[derive(Clone, Debug)]
struct PendingChange {
    change: Change,
    /// Handed out by a poll at least once.
    delivered: bool,
}

/// One file's tree plus the moves queued for its editor.
#[derive(Debug)]
pub struct FileGraph {
    graph: EditGraph,
    current_node_id: String,
    pending: Vec<PendingChange>,
}

impl FileGraph {
    pub fn new(file_id: &str) -> Self {
        FileGraph {
            graph: EditGraph::new(file_id),
            current_node_id: ROOT_NODE_ID.to_string(),
            pending: Vec::new(),
        }
    }

    pub fn file_id(&self) -> &str {
        self.graph.file_id()
    }

    pub fn current_node_id(&self) -> &str {
        &self.current_node_id
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn view(&self) -> GraphView {
        self.graph.to_view(&self.current_node_id)
    }

    pub fn reconstruct(&self, node_id: &str) -> Result<String> {
        Ok(self.graph.reconstruct(node_id)?)
    }

    /// Register a child of `parent_node_id` and make it current.
    ///
    /// A patch must apply cleanly to its parent's content.
    pub fn add_node(&mut self, parent_node_id: &str, delta: Delta) -> Result<String> {
        if !self.graph.contains(parent_node_id) {
            return Err(Error::NotFound(format!(
                "Parent node {} does not exist",
                parent_node_id
            )));
        }
        if let Delta::Patch(patch) = &delta {
            patch
                .validate()
                .map_err(|e| Error::BadRequest(format!("Malformed patch: {}", e)))?;
            let base = self.graph.reconstruct(parent_node_id)?;
            apply_delta(&delta, &base).map_err(|e| {
                Error::Conflict(format!(
                    "Patch does not apply to {}: {}",
                    parent_node_id, e
                ))
            })?;
        }

        let node_id = uuid::Uuid::new_v4().to_string();
        let file_id = self.graph.file_id().to_string();
        self.graph.insert(Node {
            node_id: node_id.clone(),
            parent: ParentRef::from_id(parent_node_id),
            payload: delta,
            file_id,
        })?;
        self.current_node_id = node_id.clone();
        Ok(node_id)
    }

    /// Queue a move for the editor.
    ///
    /// Navigating to the node the editor is already at re-applies it;
    /// anything else reverts `target_node_id`'s delta and lands on
    /// `current_node_id`.
    pub fn navigate(&mut self, current_node_id: &str, target_node_id: &str) -> Result<ChangeMode> {
        if target_node_id == ROOT_NODE_ID {
            return Err(Error::Conflict("The root node has no delta to apply".into()));
        }
        let target = self
            .graph
            .get(target_node_id)
            .ok_or_else(|| Error::NotFound(format!("Node {} does not exist", target_node_id)))?;
        if !self.graph.contains(current_node_id) {
            return Err(Error::NotFound(format!(
                "Current node {} does not exist",
                current_node_id
            )));
        }

        let (mode, node_id) = if current_node_id == target_node_id {
            (ChangeMode::Apply, target_node_id)
        } else {
            (ChangeMode::Revert, current_node_id)
        };
        let change = Change {
            node_id: node_id.to_string(),
            delta: target.payload.clone(),
            mode: mode.clone(),
        };

        self.current_node_id = current_node_id.to_string();
        self.pending.push(PendingChange {
            change,
            delivered: false,
        });
        Ok(mode)
    }

    /// Every queued change, oldest first. Marks them delivered.
    pub fn poll(&mut self) -> Vec<Change> {
        self.pending
            .iter_mut()
            .map(|p| {
                p.delivered = true;
                p.change.clone()
            })
            .collect()
    }

    /// Drop acknowledged changes and return how many remain. Changes queued
    /// since the last poll stay, even when they share an acknowledged id.
    ///
    /// A delivered change missing from the acknowledgment was skipped by the
    /// editor. The queue is then replaced by a single full snapshot of the
    /// current node.
    pub fn acknowledge(&mut self, node_ids: &[String]) -> usize {
        let acked: HashSet<&str> = node_ids.iter().map(String::as_str).collect();
        let skipped = self
            .pending
            .iter()
            .any(|p| p.delivered && !acked.contains(p.change.node_id.as_str()));

        if skipped {
            match self.graph.reconstruct(&self.current_node_id) {
                Ok(content) => {
                    warn!(
                        "[Authority] {} skipped changes, resyncing at {}",
                        self.file_id(),
                        self.current_node_id
                    );
                    self.pending = vec![PendingChange {
                        change: Change {
                            node_id: self.current_node_id.clone(),
                            delta: Delta::Snapshot(content),
                            mode: ChangeMode::Apply,
                        },
                        delivered: false,
                    }];
                    return self.pending.len();
                }
                Err(e) => warn!(
                    "[Authority] Cannot rebuild {} for resync: {}",
                    self.current_node_id, e
                ),
            }
        }

        self.pending
            .retain(|p| !(p.delivered && acked.contains(p.change.node_id.as_str())));
        self.pending.len()
    }
}

/// Shared state for the authority's handlers.
#[derive(Clone, Default)]
pub struct AppState {
    graphs: Arc<RwLock<HashMap<String, FileGraph>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against `file_id`'s graph, creating the graph if needed.
    pub fn with_graph<R>(&self, file_id: &str, f: impl FnOnce(&mut FileGraph) -> R) -> R {
        let mut graphs = self.graphs.write();
        let graph = graphs.entry(file_id.to_string()).or_insert_with(|| {
            info!("[Authority] New graph for {}", file_id);
            FileGraph::new(file_id)
        });
        f(graph)
    }

    pub fn file_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.graphs.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}
