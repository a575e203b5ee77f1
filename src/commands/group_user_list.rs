//! `aad o365group user list` - owners, members and guests of a Microsoft 365 group

use super::CommandContext;
use crate::graph::pager;
use crate::validation::is_valid_guid;
use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const USER_FIELDS: &str = "id,displayName,userPrincipalName,userType";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum GroupRole {
    Owner,
    Member,
    Guest,
}

impl GroupRole {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupRole::Owner => "Owner",
            GroupRole::Member => "Member",
            GroupRole::Guest => "Guest",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct GroupUserListOptions {
    /// Id of the Microsoft 365 group
    #[arg(short = 'i', long)]
    pub group_id: String,

    /// Only list users with this role
    #[arg(short, long, value_enum)]
    pub role: Option<GroupRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

pub async fn run(ctx: &CommandContext<'_>, options: &GroupUserListOptions) -> Result<Vec<GroupUser>> {
    if !is_valid_guid(&options.group_id) {
        bail!("{} is not a valid GUID", options.group_id);
    }

    ctx.progress("Retrieving group owners...");
    let mut users: Vec<GroupUser> = pager::fetch_all_with_progress(
        ctx.transport,
        &ctx.url(&format!("groups/{}/owners?$select={USER_FIELDS}", options.group_id)),
        ctx.page_observer("owners"),
    )
    .await?;

    // Graph reports owners with their directory user type; relabel them
    for user in &mut users {
        user.user_type = Some(GroupRole::Owner.as_str().to_string());
    }

    if options.role != Some(GroupRole::Owner) {
        ctx.progress("Retrieving group members...");
        let members: Vec<GroupUser> = pager::fetch_all_with_progress(
            ctx.transport,
            &ctx.url(&format!("groups/{}/members?$select={USER_FIELDS}", options.group_id)),
            ctx.page_observer("members"),
        )
        .await?;
        users.extend(members);
    }

    if let Some(role) = options.role {
        users.retain(|user| user.user_type.as_deref() == Some(role.as_str()));
    }

    Ok(users)
}
