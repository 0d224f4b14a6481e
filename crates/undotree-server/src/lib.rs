//! Reference undo-tree authority.
//!
//! Keeps every file's graph in memory and queues navigation moves for the
//! editor to pull. Nothing is persisted.

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{Error, Result};
pub use state::{AppState, FileGraph};

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/graph", get(handlers::get_graph))
        .route("/api/nodes", post(handlers::add_node))
        .route("/api/navigate", post(handlers::navigate))
        .route("/api/poll_changes", get(handlers::poll_changes))
        .route("/api/ack_changes", post(handlers::ack_changes))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process exits.
pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(AppState::new());

    info!("[Authority] Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
