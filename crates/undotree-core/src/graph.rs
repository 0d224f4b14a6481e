//! Client-side view of a file's edit-history tree.
//!
//! Nodes are immutable once inserted. Every node hangs off exactly one parent,
//! either another node or the root sentinel, whose content is empty.

use crate::error::{Result, SyncError};
use crate::patch::apply_delta;
use std::collections::{BTreeMap, HashMap};
use undotree_http::{Delta, GraphView, NodeEntry, ROOT_NODE_ID};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParentRef {
    Root,
    Node(String),
}

impl ParentRef {
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        if id == ROOT_NODE_ID {
            ParentRef::Root
        } else {
            ParentRef::Node(id.to_string())
        }
    }

    #[must_use]
    pub fn as_id(&self) -> &str {
        match self {
            ParentRef::Root => ROOT_NODE_ID,
            ParentRef::Node(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub node_id: String,
    pub parent: ParentRef,
    pub payload: Delta,
    pub file_id: String,
}

impl Node {
    #[inline]
    #[must_use]
    pub fn is_full_content(&self) -> bool {
        self.payload.is_full_content()
    }
}

/// A singly-parented tree of [`Node`]s for one file.
#[derive(Clone, Debug, Default)]
pub struct EditGraph {
    file_id: String,
    nodes: HashMap<String, Node>,
    // Keyed by parent id (the root sentinel included), in insertion order.
    children: HashMap<String, Vec<String>>,
}

impl EditGraph {
    pub fn new(file_id: impl Into<String>) -> Self {
        EditGraph {
            file_id: file_id.into(),
            nodes: HashMap::new(),
            children: HashMap::new(),
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        node_id == ROOT_NODE_ID || self.nodes.contains_key(node_id)
    }

    pub fn get(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn children_of(&self, node_id: &str) -> &[String] {
        self.children
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Insert a node whose parent is already present.
    ///
    /// Returns `false` if a node with the same id exists; nodes are never
    /// replaced.
    pub fn insert(&mut self, node: Node) -> Result<bool> {
        if self.nodes.contains_key(&node.node_id) {
            return Ok(false);
        }
        if !self.contains(node.parent.as_id()) {
            return Err(SyncError::UnknownNode(node.parent.as_id().to_string()));
        }
        self.insert_unchecked(node);
        Ok(true)
    }

    fn insert_unchecked(&mut self, node: Node) {
        self.children
            .entry(node.parent.as_id().to_string())
            .or_default()
            .push(node.node_id.clone());
        self.nodes.insert(node.node_id.clone(), node);
    }

    /// Nodes from the first child of the root down to `node_id`.
    ///
    /// Fails with [`SyncError::Cycle`] if the parent chain is longer than the
    /// graph itself.
    pub fn path_to_root(&self, node_id: &str) -> Result<Vec<&Node>> {
        let mut path = Vec::new();
        let mut cursor = ParentRef::from_id(node_id);

        while let ParentRef::Node(id) = cursor {
            if path.len() > self.nodes.len() {
                return Err(SyncError::Cycle(node_id.to_string()));
            }
            let node = self
                .nodes
                .get(&id)
                .ok_or_else(|| SyncError::UnknownNode(id.clone()))?;
            path.push(node);
            cursor = node.parent.clone();
        }

        path.reverse();
        Ok(path)
    }

    /// Content at `node_id`, replaying payloads from the root.
    pub fn reconstruct(&self, node_id: &str) -> Result<String> {
        let mut content = String::new();
        for node in self.path_to_root(node_id)? {
            content = apply_delta(&node.payload, &content)?;
        }
        Ok(content)
    }

    /// Build a graph from the authority's listing.
    pub fn from_view(file_id: impl Into<String>, view: &GraphView) -> Result<Self> {
        let file_id: String = file_id.into();
        let mut graph = EditGraph::new(file_id.clone());

        for (id, entry) in &view.nodes {
            if id == ROOT_NODE_ID {
                continue;
            }
            let Some(delta) = entry.delta.clone() else {
                tracing::warn!("[Graph] Node {} has no payload, skipping", id);
                continue;
            };
            let parent = entry
                .parents
                .first()
                .map(|p| ParentRef::from_id(p))
                .unwrap_or(ParentRef::Root);
            graph.insert_unchecked(Node {
                node_id: id.clone(),
                parent,
                payload: delta,
                file_id: file_id.clone(),
            });
        }

        for node in graph.nodes.values() {
            if !graph.contains(node.parent.as_id()) {
                return Err(SyncError::UnknownNode(node.parent.as_id().to_string()));
            }
        }

        Ok(graph)
    }

    /// The listing served by `GET /api/graph`.
    pub fn to_view(&self, current_node_id: &str) -> GraphView {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            ROOT_NODE_ID.to_string(),
            NodeEntry {
                id: ROOT_NODE_ID.to_string(),
                delta: None,
                parents: Vec::new(),
                children: self.children_of(ROOT_NODE_ID).to_vec(),
            },
        );
        for (id, node) in &self.nodes {
            nodes.insert(
                id.clone(),
                NodeEntry {
                    id: id.clone(),
                    delta: Some(node.payload.clone()),
                    parents: vec![node.parent.as_id().to_string()],
                    children: self.children_of(id).to_vec(),
                },
            );
        }
        GraphView {
            nodes,
            current_node_id: current_node_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::diff;

    fn node(id: &str, parent: &str, payload: Delta) -> Node {
        Node {
            node_id: id.into(),
            parent: ParentRef::from_id(parent),
            payload,
            file_id: "f".into(),
        }
    }

    fn sample() -> EditGraph {
        let mut graph = EditGraph::new("f");
        graph
            .insert(node("n1", "root", Delta::Snapshot("Hello World!".into())))
            .unwrap();
        graph
            .insert(node(
                "n2",
                "n1",
                diff("Hello World!", "Hello World! How").into(),
            ))
            .unwrap();
        graph
            .insert(node(
                "n3",
                "n2",
                diff("Hello World! How", "Hello World! How are").into(),
            ))
            .unwrap();
        graph
            .insert(node(
                "n5",
                "n2",
                diff("Hello World! How", "Hello World! How do").into(),
            ))
            .unwrap();
        graph
    }

    #[test]
    fn test_reconstruct_branches() {
        let graph = sample();
        assert_eq!(graph.reconstruct("root").unwrap(), "");
        assert_eq!(graph.reconstruct("n1").unwrap(), "Hello World!");
        assert_eq!(graph.reconstruct("n3").unwrap(), "Hello World! How are");
        assert_eq!(graph.reconstruct("n5").unwrap(), "Hello World! How do");
        assert_eq!(graph.children_of("n2"), &["n3".to_string(), "n5".to_string()]);
    }

    #[test]
    fn test_insert_requires_parent() {
        let mut graph = EditGraph::new("f");
        let err = graph
            .insert(node("n9", "missing", Delta::Snapshot("x".into())))
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownNode(id) if id == "missing"));
    }

    #[test]
    fn test_insert_never_replaces() {
        let mut graph = sample();
        let inserted = graph
            .insert(node("n1", "root", Delta::Snapshot("other".into())))
            .unwrap();
        assert!(!inserted);
        assert_eq!(graph.reconstruct("n1").unwrap(), "Hello World!");
    }

    #[test]
    fn test_view_round_trip() {
        let graph = sample();
        let view = graph.to_view("n3");
        assert_eq!(view.current_node_id, "n3");
        assert_eq!(view.nodes["root"].children, vec!["n1".to_string()]);

        let rebuilt = EditGraph::from_view("f", &view).unwrap();
        assert_eq!(rebuilt.len(), graph.len());
        assert_eq!(rebuilt.reconstruct("n5").unwrap(), "Hello World! How do");
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut view = GraphView::default();
        for (id, parent) in [("a", "b"), ("b", "a")] {
            view.nodes.insert(
                id.into(),
                NodeEntry {
                    id: id.into(),
                    delta: Some(Delta::Snapshot(String::new())),
                    parents: vec![parent.into()],
                    children: Vec::new(),
                },
            );
        }
        let graph = EditGraph::from_view("f", &view).unwrap();
        assert!(matches!(graph.reconstruct("a"), Err(SyncError::Cycle(_))));
    }
}
