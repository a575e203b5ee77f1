//! Transport capability consumed by the paginator and the command orchestrators.

use super::error::GraphResult;
use async_trait::async_trait;
use serde_json::Value;

/// Authenticated JSON transport.
///
/// Implementations attach credentials themselves. An empty 2xx body is
/// returned as `Value::Null`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> GraphResult<Value>;

    async fn post(&self, url: &str, body: &Value) -> GraphResult<Value>;

    async fn patch(&self, url: &str, body: &Value) -> GraphResult<Value>;
}

