//! Error types for the Microsoft Graph transport boundary.

use serde::Deserialize;
use thiserror::Error;

/// Result type alias using `GraphError`.
pub type GraphResult<T> = Result<T, GraphError>;

/// Failures raised at the network boundary.
///
/// These are never retried or swallowed inside the crate; every caller
/// receives them unmodified.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Non-2xx response from Microsoft Graph.
    #[error("Graph API error ({status}): {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Connection or protocol failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No usable access token.
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl GraphError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Api { status, .. } => Some(*status),
            GraphError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// `OData` error envelope returned by Microsoft Graph.
#[derive(Debug, Deserialize)]
pub struct ODataError {
    pub error: ODataErrorBody,
}

/// `OData` error body.
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: String,
}

/// Build an API error from a status code and raw response body.
pub(crate) fn api_error(status: u16, body: &str) -> GraphError {
    match serde_json::from_str::<ODataError>(body) {
        Ok(odata) => GraphError::Api {
            status,
            code: odata.error.code,
            message: odata.error.message,
        },
        Err(_) => GraphError::Api {
            status,
            code: status.to_string(),
            message: body.to_string(),
        },
    }
}
