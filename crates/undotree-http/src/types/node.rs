use crate::types::Delta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /api/nodes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNode {
    pub file_id: String,
    pub parent_node_id: String,
    pub delta: Delta,
    #[serde(default)]
    pub is_full_content: bool,
}

impl NewNode {
    #[must_use]
    pub fn new(file_id: impl Into<String>, parent_node_id: impl Into<String>, delta: Delta) -> Self {
        let is_full_content = delta.is_full_content();
        NewNode {
            file_id: file_id.into(),
            parent_node_id: parent_node_id.into(),
            delta,
            is_full_content,
        }
    }
}

/// `201 Created` body of `POST /api/nodes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCreated {
    pub node_id: String,
    #[serde(default)]
    pub message: String,
}

/// A node as listed by `GET /api/graph`. The root has no delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Body of `GET /api/graph`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeEntry>,
    pub current_node_id: String,
}
