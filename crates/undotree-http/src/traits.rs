use crate::error::Result;
use crate::types::{Change, GraphView, NewNode};
use async_trait::async_trait;

/// The four calls the sync engine makes against the graph authority.
///
/// [`crate::GraphClient`] speaks HTTP; tests substitute an in-memory fake.
#[async_trait]
pub trait GraphRemote: Send + Sync + 'static {
    /// Fetch (and lazily create) the graph for `file_id`.
    async fn fetch_graph(&self, file_id: &str) -> Result<GraphView>;

    /// Register a node and return the id the authority assigned to it.
    async fn push_node(&self, node: &NewNode) -> Result<String>;

    /// Pending changes for `file_id`, oldest first.
    async fn poll_changes(&self, file_id: &str) -> Result<Vec<Change>>;

    /// Confirm that `node_ids` were applied locally.
    async fn ack_changes(&self, file_id: &str, node_ids: &[String]) -> Result<()>;
}
