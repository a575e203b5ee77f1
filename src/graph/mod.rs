//! Microsoft Graph interaction module
//!
//! This module provides the transport boundary for the commands:
//! authentication, the HTTP client, and collection pagination.
//!
//! # Module Structure
//!
//! - [`auth`] - Access token sources (explicit token or Azure CLI)
//! - [`client`] - Main Graph client, implements [`Transport`]
//! - [`error`] - Transport error taxonomy
//! - [`http`] - HTTP utilities for REST calls
//! - [`pager`] - Follows `@odata.nextLink` across pages
//! - [`transport`] - The transport capability trait
//!
//! # Example
//!
//! ```ignore
//! use m365ctl::graph::{auth::GraphCredentials, client::GraphClient, pager};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GraphClient::new(
//!         "https://graph.microsoft.com",
//!         GraphCredentials::discover(None, "https://graph.microsoft.com"),
//!     )?;
//!     let users: Vec<serde_json::Value> = pager::fetch_all(&client, &client.url("users")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod pager;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GraphClient;
pub use error::{GraphError, GraphResult};
pub use transport::Transport;
