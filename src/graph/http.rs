//! HTTP utilities for Microsoft Graph REST calls

use super::error::{api_error, GraphResult};
use reqwest::{Client, Method};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

const USER_AGENT: &str = concat!("m365ctl/", env!("CARGO_PKG_VERSION"));

/// Graph returns OData annotations unless asked not to
const ACCEPT_JSON: &str = "application/json;odata.metadata=none";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for Graph API calls
#[derive(Clone)]
pub struct GraphHttpClient {
    client: Client,
}

impl GraphHttpClient {
    /// Create a new HTTP client
    pub fn new() -> GraphResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, token: &str) -> GraphResult<Value> {
        self.send(Method::GET, url, token, None).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &str, token: &str, body: &Value) -> GraphResult<Value> {
        self.send(Method::POST, url, token, Some(body)).await
    }

    /// Make a PATCH request with a JSON body
    pub async fn patch(&self, url: &str, token: &str, body: &Value) -> GraphResult<Value> {
        self.send(Method::PATCH, url, token, Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&Value>,
    ) -> GraphResult<Value> {
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, ACCEPT_JSON);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            // Only log sanitized/truncated error body
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&response_body));
            return Err(api_error(status.as_u16(), &response_body));
        }

        // PATCH and some POSTs answer 204 No Content
        if response_body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response_body)?)
    }
}

/// Short hint to print next to an error, for the statuses users can act on
pub fn error_hint(error: &anyhow::Error) -> Option<&'static str> {
    let status = error
        .chain()
        .find_map(|e| e.downcast_ref::<super::error::GraphError>())
        .and_then(|e| e.status())?;

    match status {
        401 => Some("Authentication failed. Set M365_ACCESS_TOKEN or run 'az login'."),
        403 => Some("Permission denied. Check the permissions granted to your account."),
        429 => Some("Rate limit exceeded. Please try again later."),
        _ => None,
    }
}
