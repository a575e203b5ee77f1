//! `teams app list` - apps in the Teams app catalog or installed in a team

use super::{CommandContext, LookupError};
use crate::graph::pager;
use crate::output::{extract_json_value, OutputMode};
use crate::validation::is_valid_guid;
use anyhow::{bail, Result};
use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default, Args)]
pub struct TeamsAppListOptions {
    /// Include apps not distributed by the organization
    #[arg(short, long)]
    pub all: bool,

    /// Id of the team to list installed apps for
    #[arg(short = 'i', long)]
    pub team_id: Option<String>,

    /// Display name of the team to list installed apps for
    #[arg(short = 't', long)]
    pub team_name: Option<String>,
}

impl TeamsAppListOptions {
    pub fn validate(&self) -> Result<()> {
        if self.team_id.is_some() && self.team_name.is_some() {
            bail!("Specify either teamId or teamName, but not both.");
        }

        if let Some(team_id) = self.team_id.as_deref() {
            if !is_valid_guid(team_id) {
                bail!("{} is not a valid GUID", team_id);
            }
        }

        Ok(())
    }

    fn targets_team(&self) -> bool {
        self.team_id.is_some() || self.team_name.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct Team {
    id: String,
}

pub async fn run(ctx: &CommandContext<'_>, options: &TeamsAppListOptions) -> Result<Value> {
    options.validate()?;

    let url = endpoint_url(ctx, options).await?;

    ctx.progress("Retrieving Teams apps...");
    let items: Vec<Value> =
        pager::fetch_all_with_progress(ctx.transport, &url, ctx.page_observer("apps")).await?;

    if ctx.output == OutputMode::Text {
        let prefix = if options.targets_team() { "teamsApp." } else { "" };
        let rows = items
            .iter()
            .map(|item| {
                json!({
                    "id": extract_json_value(item, "id"),
                    "displayName": extract_json_value(item, &format!("{prefix}displayName")),
                    "distributionMethod": extract_json_value(item, &format!("{prefix}distributionMethod")),
                })
            })
            .collect();
        return Ok(Value::Array(rows));
    }

    Ok(Value::Array(items))
}

async fn endpoint_url(ctx: &CommandContext<'_>, options: &TeamsAppListOptions) -> Result<String> {
    if !options.targets_team() {
        let mut url = ctx.url("appCatalogs/teamsApps");
        if !options.all {
            url.push_str("?$filter=distributionMethod eq 'organization'");
        }
        return Ok(url);
    }

    let team_id = match options.team_id.as_deref() {
        Some(id) => id.to_string(),
        None => team_id_by_name(ctx, options.team_name.as_deref().unwrap_or_default()).await?,
    };

    let mut url = ctx.url(&format!(
        "teams/{}/installedApps?$expand=teamsApp",
        urlencoding::encode(&team_id)
    ));
    if !options.all {
        url.push_str("&$filter=teamsApp/distributionMethod eq 'organization'");
    }
    Ok(url)
}

async fn team_id_by_name(ctx: &CommandContext<'_>, name: &str) -> Result<String> {
    ctx.progress(&format!("Looking up team {name}..."));

    let url = ctx.url(&format!(
        "me/joinedTeams?$filter=displayName eq '{}'",
        urlencoding::encode(name)
    ));
    let teams = pager::fetch_page::<Team, _>(ctx.transport, &url).await?.value;

    match teams.as_slice() {
        [] => Err(LookupError::NotFound(
            "The specified team does not exist in the Microsoft Teams".to_string(),
        )
        .into()),
        [team] => Ok(team.id.clone()),
        _ => {
            let ids: Vec<&str> = teams.iter().map(|t| t.id.as_str()).collect();
            Err(LookupError::Ambiguous(format!(
                "Multiple Microsoft Teams teams with name {} found: {}",
                name,
                ids.join(",")
            ))
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::ScriptedTransport;

    const GRAPH: &str = "https://graph.microsoft.com/v1.0";
    const TEAM_ID: &str = "6f6fd3f7-9ba5-4488-bbe6-a789004d0d55";

    fn catalog() -> Value {
        json!({
            "value": [
                { "id": "a1", "externalId": null, "displayName": "Contoso App", "distributionMethod": "organization" }
            ]
        })
    }

    fn installed() -> Value {
        json!({
            "value": [
                {
                    "id": "inst-1",
                    "teamsApp": { "id": "a1", "displayName": "Contoso App", "distributionMethod": "organization" }
                }
            ]
        })
    }

    fn installed_url(all: bool) -> String {
        let url = format!("{GRAPH}/teams/{TEAM_ID}/installedApps?$expand=teamsApp");
        if all {
            url
        } else {
            format!("{url}&$filter=teamsApp/distributionMethod eq 'organization'")
        }
    }

    #[test]
    fn test_validation() {
        let both = TeamsAppListOptions {
            team_id: Some(TEAM_ID.to_string()),
            team_name: Some("Team".to_string()),
            ..Default::default()
        };
        assert_eq!(
            both.validate().unwrap_err().to_string(),
            "Specify either teamId or teamName, but not both."
        );

        let bad = TeamsAppListOptions {
            team_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().to_string(), "abc is not a valid GUID");
    }

    #[tokio::test]
    async fn test_lists_organization_catalog() {
        let transport = ScriptedTransport::new();
        transport.on_get(
            &format!("{GRAPH}/appCatalogs/teamsApps?$filter=distributionMethod eq 'organization'"),
            catalog(),
        );
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let output = run(&ctx, &TeamsAppListOptions::default()).await.unwrap();
        assert_eq!(output, catalog()["value"]);
    }

    #[tokio::test]
    async fn test_lists_whole_catalog_with_all() {
        let transport = ScriptedTransport::new();
        transport.on_get(&format!("{GRAPH}/appCatalogs/teamsApps"), catalog());
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let options = TeamsAppListOptions {
            all: true,
            ..Default::default()
        };
        assert!(run(&ctx, &options).await.is_ok());
    }

    #[tokio::test]
    async fn test_text_output_flattens_installations() {
        let transport = ScriptedTransport::new();
        transport.on_get(&installed_url(false), installed());
        let mut ctx = CommandContext::new(&transport, "https://graph.microsoft.com");
        ctx.output = OutputMode::Text;

        let options = TeamsAppListOptions {
            team_id: Some(TEAM_ID.to_string()),
            ..Default::default()
        };
        let output = run(&ctx, &options).await.unwrap();

        assert_eq!(
            output,
            json!([{ "id": "inst-1", "displayName": "Contoso App", "distributionMethod": "organization" }])
        );
    }

    #[tokio::test]
    async fn test_resolves_team_by_name() {
        let transport = ScriptedTransport::new();
        transport.on_get(
            &format!("{GRAPH}/me/joinedTeams?$filter=displayName eq 'Sales%20%26%20Marketing'"),
            json!({ "value": [{ "id": TEAM_ID, "displayName": "Sales & Marketing" }] }),
        );
        transport.on_get(&installed_url(true), installed());
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let options = TeamsAppListOptions {
            all: true,
            team_name: Some("Sales & Marketing".to_string()),
            ..Default::default()
        };
        let output = run(&ctx, &options).await.unwrap();
        assert_eq!(output, installed()["value"]);
    }

    #[tokio::test]
    async fn test_team_name_not_found_or_ambiguous() {
        let transport = ScriptedTransport::new();
        let url = format!("{GRAPH}/me/joinedTeams?$filter=displayName eq 'Sales'");
        transport.on_get(&url, json!({ "value": [] }));
        transport.on_get(&url, json!({ "value": [{ "id": "t1" }, { "id": "t2" }] }));
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let options = TeamsAppListOptions {
            team_name: Some("Sales".to_string()),
            ..Default::default()
        };

        let err = run(&ctx, &options).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<LookupError>(),
            Some(&LookupError::NotFound(
                "The specified team does not exist in the Microsoft Teams".to_string()
            ))
        );

        let err = run(&ctx, &options).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Multiple Microsoft Teams teams with name Sales found: t1,t2"
        );
    }
}
