//! Configuration Management
//!
//! Handles persistent configuration storage for m365ctl.

use crate::graph::client::DEFAULT_ENDPOINT;
use crate::output::OutputMode;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the Graph endpoint (national clouds)
pub const ENDPOINT_ENV: &str = "M365_GRAPH_ENDPOINT";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Graph endpoint, e.g. `https://graph.microsoft.us`
    #[serde(default)]
    pub graph_endpoint: Option<String>,
    /// Default output mode
    #[serde(default)]
    pub output: Option<OutputMode>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("m365ctl").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, defaulting on any problem
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Get effective endpoint (CLI > env > config > public cloud)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| std::env::var(ENDPOINT_ENV).ok().filter(|v| !v.is_empty()))
            .or_else(|| self.graph_endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Get effective output mode (CLI > config > json)
    pub fn effective_output(&self, cli: Option<OutputMode>) -> OutputMode {
        cli.or(self.output).unwrap_or_default()
    }

    /// Set endpoint and save
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<()> {
        self.graph_endpoint = Some(normalize_endpoint(endpoint)?);
        self.save()
    }

    /// Set output mode and save
    pub fn set_output(&mut self, output: OutputMode) -> Result<()> {
        self.output = Some(output);
        self.save()
    }
}

/// Check that `endpoint` is an absolute http(s) URL and drop trailing slashes
pub fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let parsed = url::Url::parse(endpoint).with_context(|| format!("Invalid endpoint: {endpoint}"))?;
    if !matches!(parsed.scheme(), "https" | "http") {
        bail!("Invalid endpoint: {endpoint}. Use an http or https URL");
    }
    Ok(endpoint.trim_end_matches('/').to_string())
}
