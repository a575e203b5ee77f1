//! Command orchestrators
//!
//! Each command validates its options, sequences the Graph calls it needs
//! and returns the value to print. Calls are strictly sequential; the first
//! failure aborts the command.
//!
//! - [`app_add`] - `aad app add`
//! - [`group_user_list`] - `aad o365group user list`
//! - [`user_get`] - `aad user get`
//! - [`external_connection_add`] - `search externalconnection add`
//! - [`teams_app_list`] - `teams app list`

pub mod app_add;
pub mod external_connection_add;
pub mod group_user_list;
pub mod teams_app_list;
pub mod user_get;

use crate::graph::client::api_url;
use crate::graph::pager::PageProgress;
use crate::graph::Transport;
use crate::output::OutputMode;
use crate::rc::RC_FILE_NAME;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Lookups that must match exactly one directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{0}")]
    NotFound(String),

    /// Several entries matched; the message lists them all
    #[error("{0}")]
    Ambiguous(String),
}

/// Everything a command needs besides its own options.
pub struct CommandContext<'a> {
    pub transport: &'a dyn Transport,
    /// Graph endpoint without trailing slash
    pub endpoint: String,
    pub output: OutputMode,
    /// Print step progress on stderr
    pub verbose: bool,
    /// Also print resolved data and paging progress on stderr
    pub debug: bool,
    /// Location of `.m365rc.json`
    pub rc_path: PathBuf,
}

impl<'a> CommandContext<'a> {
    pub fn new(transport: &'a dyn Transport, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            output: OutputMode::default(),
            verbose: false,
            debug: false,
            rc_path: PathBuf::from(RC_FILE_NAME),
        }
    }

    /// `<endpoint>/v1.0/<path>`
    pub fn url(&self, path: &str) -> String {
        api_url(&self.endpoint, path)
    }

    /// Report a command step
    pub fn progress(&self, message: &str) {
        tracing::info!("{}", message);
        if self.verbose || self.debug {
            eprintln!("{message}");
        }
    }

    /// Dump intermediate data when debugging
    pub fn debug_json<T: Serialize>(&self, label: &str, value: &T) {
        let rendered = serde_json::to_string_pretty(value).unwrap_or_default();
        tracing::debug!("{}: {}", label, rendered);
        if self.debug {
            eprintln!("{label}: {rendered}");
        }
    }

    /// Paginator observer reporting each fetched page of `what`
    pub fn page_observer<'s>(&'s self, what: &'s str) -> impl FnMut(&PageProgress) + 's {
        move |progress: &PageProgress| {
            tracing::debug!(
                "{}: page {} with {} items ({} total)",
                what,
                progress.page,
                progress.page_items,
                progress.total_items
            );
            if self.debug {
                eprintln!(
                    "Retrieved page {} of {} ({} items so far{})",
                    progress.page,
                    what,
                    progress.total_items,
                    if progress.has_more { ", more to come" } else { "" }
                );
            }
        }
    }
}
