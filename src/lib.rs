//! m365ctl - Microsoft 365 operations over the Microsoft Graph REST API
//!
//! - [`graph`] - Authentication, HTTP transport and pagination
//! - [`directory`] - Service principal index and permission resolution
//! - [`manifest`] - Azure portal manifest to Graph application conversion
//! - [`commands`] - One orchestrator per CLI command
//! - [`config`], [`rc`] - Persistent user settings and the project `.m365rc.json`
//! - [`output`] - json / yaml / text rendering

pub mod commands;
pub mod config;
pub mod directory;
pub mod graph;
pub mod manifest;
pub mod output;
pub mod rc;
pub mod validation;

/// Version injected at compile time via M365CTL_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("M365CTL_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
