//! Project-local `.m365rc.json` file
//!
//! Keeps track of app registrations created from a project folder so other
//! tooling can pick them up.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const RC_FILE_NAME: &str = ".m365rc.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct M365Rc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<Vec<RcApp>>,
    /// Anything else other tools keep in the file
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RcApp {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Extra keys other tools attach to an entry
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl RcApp {
    pub fn new(app_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            name: Some(name.into()),
            other: Map::new(),
        }
    }
}

impl M365Rc {
    /// Read the file; a missing or empty file yields an empty document
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        tracing::debug!("Reading existing {:?}", path);
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn add_app(&mut self, app: RcApp) {
        self.apps.get_or_insert_with(Vec::new).push(app);
    }
}

/// Append an app to the rc file at `path`, creating the file if needed
pub fn record_app(path: &Path, app: RcApp) -> Result<()> {
    let mut rc = M365Rc::load(path)?;
    rc.add_app(app);
    rc.save(path)
}
