//! Graph Client
//!
//! Main client for Microsoft Graph, combining authentication
//! and HTTP functionality.

use super::auth::GraphCredentials;
use super::error::GraphResult;
use super::http::GraphHttpClient;
use super::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;

/// Public cloud Graph endpoint
pub const DEFAULT_ENDPOINT: &str = "https://graph.microsoft.com";

/// Graph API version used by every command
pub const API_VERSION: &str = "v1.0";

/// Main Graph client
#[derive(Clone)]
pub struct GraphClient {
    pub credentials: GraphCredentials,
    pub http: GraphHttpClient,
    endpoint: String,
}

impl GraphClient {
    /// Create a new Graph client for `endpoint` (e.g. `https://graph.microsoft.com`)
    pub fn new(endpoint: &str, credentials: GraphCredentials) -> GraphResult<Self> {
        let http = GraphHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Graph endpoint without trailing slash
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build a versioned API URL, e.g. `url("me/joinedTeams")`
    pub fn url(&self, path: &str) -> String {
        api_url(&self.endpoint, path)
    }
}

/// Build `<endpoint>/v1.0/<path>`
pub fn api_url(endpoint: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        API_VERSION,
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl Transport for GraphClient {
    async fn get(&self, url: &str) -> GraphResult<Value> {
        let token = self.credentials.get_token().await?;
        self.http.get(url, &token).await
    }

    async fn post(&self, url: &str, body: &Value) -> GraphResult<Value> {
        let token = self.credentials.get_token().await?;
        self.http.post(url, &token, body).await
    }

    async fn patch(&self, url: &str, body: &Value) -> GraphResult<Value> {
        let token = self.credentials.get_token().await?;
        self.http.patch(url, &token, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_joins_segments() {
        assert_eq!(
            api_url("https://graph.microsoft.com/", "/me/joinedTeams"),
            "https://graph.microsoft.com/v1.0/me/joinedTeams"
        );
    }

    #[test]
    fn test_client_trims_endpoint() {
        let client = GraphClient::new(
            "https://graph.microsoft.us/",
            GraphCredentials::from_token("t"),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "https://graph.microsoft.us");
        assert_eq!(
            client.url("external/connections"),
            "https://graph.microsoft.us/v1.0/external/connections"
        );
    }
}
