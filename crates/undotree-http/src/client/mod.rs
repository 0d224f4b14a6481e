//! HTTP client for the graph authority.

mod config;
mod fetch;

pub use config::ClientConfig;
pub use fetch::GraphClient;
