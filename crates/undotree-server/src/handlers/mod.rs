//! HTTP handlers for the `/api` surface.

use crate::error::{Error, Result};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};
use undotree_http::types::{
    AckRequest, AckResponse, NavigateRequest, NavigateResponse, NodeCreated,
};
use undotree_http::{Change, GraphView, NewNode};

fn default_file_id() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    #[serde(default = "default_file_id")]
    pub file_id: String,
}

/// GET /api/graph?file_id=...
pub async fn get_graph(
    State(state): State<AppState>,
    query: std::result::Result<Query<FileQuery>, QueryRejection>,
) -> Result<Json<GraphView>> {
    let Query(query) = query?;
    let view = state.with_graph(&query.file_id, |graph| graph.view());
    Ok(Json(view))
}

/// POST /api/nodes
pub async fn add_node(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewNode>, JsonRejection>,
) -> Result<(StatusCode, Json<NodeCreated>)> {
    let Json(node) = body?;
    if node.parent_node_id.is_empty() {
        return Err(Error::BadRequest("parent_node_id and delta are required".into()));
    }

    let file_id = node.file_id.clone();
    let node_id = state.with_graph(&file_id, |graph| {
        graph.add_node(&node.parent_node_id, node.delta)
    })?;
    info!(
        "[Authority] Node {} added to {} under {}",
        node_id, file_id, node.parent_node_id
    );

    Ok((
        StatusCode::CREATED,
        Json(NodeCreated {
            message: format!("Node {} created successfully in file {}", node_id, file_id),
            node_id,
        }),
    ))
}

/// POST /api/navigate
pub async fn navigate(
    State(state): State<AppState>,
    body: std::result::Result<Json<NavigateRequest>, JsonRejection>,
) -> Result<Json<NavigateResponse>> {
    let Json(req) = body?;
    let target = req
        .target_node_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::BadRequest("target_node_id is required".into()))?;

    let mode = state.with_graph(&req.file_id, |graph| {
        graph.navigate(&req.current_node_id, &target)
    })?;
    info!(
        "[Authority] {}: {} {} landing on {}",
        req.file_id, mode, target, req.current_node_id
    );

    Ok(Json(NavigateResponse {
        message: format!(
            "[{}] Current node set to {}. Delta from {} queued for editor.",
            req.file_id, req.current_node_id, target
        ),
        mode,
    }))
}

/// GET /api/poll_changes?file_id=...
pub async fn poll_changes(
    State(state): State<AppState>,
    query: std::result::Result<Query<FileQuery>, QueryRejection>,
) -> Result<Json<Vec<Change>>> {
    let Query(query) = query?;
    let changes = state.with_graph(&query.file_id, |graph| graph.poll());
    if !changes.is_empty() {
        debug!("[Authority] Delivering {} change(s) for {}", changes.len(), query.file_id);
    }
    Ok(Json(changes))
}

/// POST /api/ack_changes
pub async fn ack_changes(
    State(state): State<AppState>,
    body: std::result::Result<Json<AckRequest>, JsonRejection>,
) -> Result<Json<AckResponse>> {
    let Json(req) = body?;
    let remaining = state.with_graph(&req.file_id, |graph| graph.acknowledge(&req.node_ids));
    debug!(
        "[Authority] {} acknowledged {:?}, {} pending",
        req.file_id, req.node_ids, remaining
    );

    Ok(Json(AckResponse {
        message: format!("Acknowledged changes for file {}.", req.file_id),
        remaining_pending_count: remaining,
    }))
}

pub async fn health_check() -> &'static str {
    "OK - undotree authority"
}
