//! Graph Authentication
//!
//! Supplies bearer tokens: an explicit token (flag or `M365_ACCESS_TOKEN`),
//! or one obtained from the Azure CLI and cached in-process.

use super::error::{GraphError, GraphResult};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Environment variable holding a ready-to-use access token
pub const ACCESS_TOKEN_ENV: &str = "M365_ACCESS_TOKEN";

/// Token expiry buffer - refresh tokens this much before they actually expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Token TTL assumed for Azure CLI tokens (they live at least an hour)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
enum TokenSource {
    Static(String),
    AzureCli { resource: String },
}

/// Graph credentials holder with token caching
#[derive(Clone)]
pub struct GraphCredentials {
    source: Arc<TokenSource>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Subset of `az account get-access-token` output
#[derive(Deserialize)]
struct AzCliToken {
    #[serde(rename = "accessToken")]
    access_token: String,
}

impl GraphCredentials {
    /// Credentials backed by a fixed bearer token
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            source: Arc::new(TokenSource::Static(token.into())),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Credentials obtained from the signed-in Azure CLI for `resource`
    pub fn azure_cli(resource: &str) -> Self {
        Self {
            source: Arc::new(TokenSource::AzureCli {
                resource: resource.to_string(),
            }),
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Pick a token source: explicit token > `M365_ACCESS_TOKEN` > Azure CLI
    pub fn discover(explicit: Option<String>, resource: &str) -> Self {
        let token = explicit.filter(|t| !t.trim().is_empty()).or_else(|| {
            std::env::var(ACCESS_TOKEN_ENV)
                .ok()
                .filter(|t| !t.trim().is_empty())
        });

        match token {
            Some(token) => {
                tracing::debug!("Using explicitly provided access token");
                Self::from_token(token.trim())
            }
            None => {
                tracing::debug!("No access token provided, falling back to Azure CLI");
                Self::azure_cli(resource)
            }
        }
    }

    /// Get an access token for API calls
    pub async fn get_token(&self) -> GraphResult<String> {
        let resource = match self.source.as_ref() {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::AzureCli { resource } => resource,
        };

        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = az_access_token(resource).await?;
        let expires_at = Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER;

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            (DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }
}

async fn az_access_token(resource: &str) -> GraphResult<String> {
    tracing::info!("Requesting access token for {} from Azure CLI", resource);

    let output = tokio::process::Command::new("az")
        .args(["account", "get-access-token", "--resource", resource, "-o", "json"])
        .output()
        .await
        .map_err(|e| {
            GraphError::Auth(format!(
                "Failed to run the Azure CLI ({e}). Set {ACCESS_TOKEN_ENV} or run 'az login'"
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GraphError::Auth(format!(
            "Azure CLI could not provide a token: {}",
            stderr.trim()
        )));
    }

    let parsed: AzCliToken = serde_json::from_slice(&output.stdout)?;
    Ok(parsed.access_token)
}
