//! Configuration for the graph authority client.

/// Configuration for the graph authority client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the authority, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Connection timeout in seconds.
    pub connection_timeout_secs: u64,
    /// Log every outgoing request at debug level.
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_ms: 10_000,
            connection_timeout_secs: 5,
            enable_logging: false,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}
