pub mod client;
pub mod error;
pub mod traits;
pub mod types;

pub use client::{ClientConfig, GraphClient};
pub use error::{GraphError, Result};
pub use traits::GraphRemote;
pub use types::{Change, ChangeMode, Delta, GraphView, NewNode, NodeEntry, Patch, Segment};

/// Sentinel parent id for the first node of every file graph.
pub const ROOT_NODE_ID: &str = "root";
