//! reqwest-backed implementation of [`GraphRemote`].

use crate::client::config::ClientConfig;
use crate::error::{GraphError, Result};
use crate::traits::GraphRemote;
use crate::types::{AckRequest, Change, GraphView, NewNode, NodeCreated};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// The graph authority client.
#[derive(Clone)]
pub struct GraphClient {
    client: Client,
    base: Url,
    config: Arc<ClientConfig>,
}

impl GraphClient {
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(config.connection_timeout_secs))
            .build()
            .map_err(|e| GraphError::Config(e.to_string()))?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: ClientConfig) -> Result<Self> {
        let mut base_str = config.base_url.trim().to_string();
        if !base_str.ends_with('/') {
            base_str.push('/');
        }
        let base = Url::parse(&base_str).map_err(|e| GraphError::InvalidUrl(e.to_string()))?;
        Ok(GraphClient {
            client,
            base,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str, file_id: Option<&str>) -> Result<Url> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| GraphError::InvalidUrl(e.to_string()))?;
        if let Some(file_id) = file_id {
            url.query_pairs_mut().append_pair("file_id", file_id);
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, label: &str) -> Result<Response> {
        if self.config.enable_logging {
            tracing::debug!("[GraphClient-Out] {}", label);
        }
        request
            .send()
            .await
            .map_err(|e| GraphError::Unavailable(e.to_string()))
    }
}

/// Turns any status other than `expected` into [`GraphError::Rejected`].
async fn expect_status(response: Response, expected: StatusCode) -> Result<Response> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GraphError::Rejected {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| GraphError::Unavailable(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| GraphError::Decode(e.to_string()))
}

#[async_trait]
impl GraphRemote for GraphClient {
    async fn fetch_graph(&self, file_id: &str) -> Result<GraphView> {
        let url = self.endpoint("api/graph", Some(file_id))?;
        let response = self.send(self.client.get(url), "GET graph").await?;
        let response = expect_status(response, StatusCode::OK).await?;
        decode(response).await
    }

    async fn push_node(&self, node: &NewNode) -> Result<String> {
        let url = self.endpoint("api/nodes", None)?;
        let response = self
            .send(self.client.post(url).json(node), "POST nodes")
            .await?;
        let response = expect_status(response, StatusCode::CREATED).await?;
        let created: NodeCreated = decode(response).await?;
        Ok(created.node_id)
    }

    async fn poll_changes(&self, file_id: &str) -> Result<Vec<Change>> {
        let url = self.endpoint("api/poll_changes", Some(file_id))?;
        let response = self.send(self.client.get(url), "GET poll_changes").await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let response = expect_status(response, StatusCode::OK).await?;
        decode(response).await
    }

    async fn ack_changes(&self, file_id: &str, node_ids: &[String]) -> Result<()> {
        let url = self.endpoint("api/ack_changes", None)?;
        let body = AckRequest {
            file_id: file_id.to_string(),
            node_ids: node_ids.to_vec(),
        };
        let response = self
            .send(self.client.post(url).json(&body), "POST ack_changes")
            .await?;
        expect_status(response, StatusCode::OK).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_query() {
        let client = GraphClient::with_config(ClientConfig::with_base_url("http://localhost:5000"))
            .unwrap();
        let url = client.endpoint("api/graph", Some("notes/a b.txt")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/graph?file_id=notes%2Fa+b.txt"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client =
            GraphClient::with_config(ClientConfig::with_base_url("http://host:1/undo")).unwrap();
        let url = client.endpoint("api/nodes", None).unwrap();
        assert_eq!(url.as_str(), "http://host:1/undo/api/nodes");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = GraphClient::with_config(ClientConfig::with_base_url("not a url"));
        assert!(matches!(result, Err(GraphError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_unreachable_authority_is_unavailable() {
        let config = ClientConfig {
            request_timeout_ms: 500,
            ..ClientConfig::with_base_url("http://127.0.0.1:1")
        };
        let client = GraphClient::with_config(config).unwrap();
        let err = client.poll_changes("f").await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
