//! `search externalconnection add` - create a Microsoft Search connection

use super::CommandContext;
use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;

/// Ids Microsoft Search keeps for its own connections
pub const RESERVED_IDS: [&str; 16] = [
    "None",
    "Directory",
    "Exchange",
    "ExchangeArchive",
    "LinkedIn",
    "Mailbox",
    "OneDriveBusiness",
    "SharePoint",
    "Teams",
    "Yammer",
    "Connectors",
    "TaskFabric",
    "PowerBI",
    "Assistant",
    "TopicEngine",
    "MSFT_All_Connectors",
];

#[derive(Debug, Clone, Args)]
pub struct ExternalConnectionAddOptions {
    /// Connection id, 3 to 32 alphanumeric characters
    #[arg(short, long)]
    pub id: String,

    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub description: String,

    /// Comma-separated ids of apps allowed to manage the connection
    #[arg(long)]
    pub authorized_app_ids: Option<String>,
}

impl ExternalConnectionAddOptions {
    pub fn validate(&self) -> Result<()> {
        let id = self.id.as_str();
        let length = id.chars().count();

        if !(3..=32).contains(&length) {
            bail!("ID must be between 3 and 32 characters in length.");
        }

        if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!("ID must only contain alphanumeric characters.");
        }

        if length > 9 && id.starts_with("Microsoft") {
            bail!("ID cannot begin with Microsoft");
        }

        if RESERVED_IDS.contains(&id) {
            bail!(
                "ID cannot be one of the following values: {}.",
                RESERVED_IDS.join(", ")
            );
        }

        Ok(())
    }

    /// Entries are kept as given, without trimming
    fn app_ids(&self) -> Vec<String> {
        match self.authorized_app_ids.as_deref() {
            None | Some("") => Vec::new(),
            Some(ids) => ids.split(',').map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExternalConnection<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    configuration: ConnectionConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionConfiguration {
    authorized_app_ids: Vec<String>,
}

pub async fn run(ctx: &CommandContext<'_>, options: &ExternalConnectionAddOptions) -> Result<Value> {
    options.validate()?;

    let connection = ExternalConnection {
        id: &options.id,
        name: &options.name,
        description: &options.description,
        configuration: ConnectionConfiguration {
            authorized_app_ids: options.app_ids(),
        },
    };

    ctx.progress(&format!("Creating external connection {}...", options.id));
    ctx.transport
        .post(&ctx.url("external/connections"), &serde_json::to_value(&connection)?)
        .await?;

    Ok(Value::Null)
}
