//! `aad user get` - look up a single user

use super::{CommandContext, LookupError};
use crate::graph::pager;
use crate::validation::{is_valid_guid, split_list};
use anyhow::{bail, Result};
use clap::Args;
use serde_json::Value;

#[derive(Debug, Clone, Default, Args)]
pub struct UserGetOptions {
    /// Object id of the user
    #[arg(short, long)]
    pub id: Option<String>,

    /// User principal name
    #[arg(short = 'n', long)]
    pub user_name: Option<String>,

    /// Mail address
    #[arg(long)]
    pub email: Option<String>,

    /// Comma-separated properties to retrieve
    #[arg(short, long)]
    pub properties: Option<String>,
}

/// Which user property the lookup filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UserKey {
    Id,
    UserName,
    Email,
}

impl UserKey {
    fn property(self) -> &'static str {
        match self {
            UserKey::Id => "id",
            UserKey::UserName => "userPrincipalName",
            UserKey::Email => "mail",
        }
    }

    fn label(self) -> &'static str {
        match self {
            UserKey::Id => "id",
            UserKey::UserName => "user name",
            UserKey::Email => "email",
        }
    }
}

impl UserGetOptions {
    fn key(&self) -> Result<(UserKey, &str)> {
        let given: Vec<(UserKey, &str)> = [
            (UserKey::Id, self.id.as_deref()),
            (UserKey::UserName, self.user_name.as_deref()),
            (UserKey::Email, self.email.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

        match given.as_slice() {
            [] => bail!("Specify either id, userName or email"),
            [(UserKey::Id, id)] if !is_valid_guid(id) => bail!("{} is not a valid GUID", id),
            [single] => Ok(*single),
            _ => bail!("Specify either id, userName or email, but not multiple"),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.key().map(|_| ())
    }
}

pub async fn run(ctx: &CommandContext<'_>, options: &UserGetOptions) -> Result<Value> {
    let (key, value) = options.key()?;

    let mut url = ctx.url(&format!(
        "users?$filter={} eq '{}'",
        key.property(),
        urlencoding::encode(value)
    ));
    if let Some(properties) = options.properties.as_deref() {
        url.push_str(&format!("&$select={}", split_list(properties).join(",")));
    }

    ctx.progress(&format!("Retrieving user with {} {}...", key.label(), value));
    let mut users = pager::fetch_page::<Value, _>(ctx.transport, &url).await?.value;

    match users.len() {
        0 => Err(LookupError::NotFound(format!(
            "The specified user with {} {} does not exist",
            key.label(),
            value
        ))
        .into()),
        1 => Ok(users.remove(0)),
        _ => {
            let names: Vec<String> = users
                .iter()
                .map(|u| crate::output::display_value(&u["userPrincipalName"]))
                .collect();
            let ids: Vec<String> = users
                .iter()
                .map(|u| crate::output::display_value(&u["id"]))
                .collect();
            Err(LookupError::Ambiguous(format!(
                "Multiple users with {} {} found. Please disambiguate (user names): {} or (ids): {}",
                key.label(),
                value,
                names.join(", "),
                ids.join(", ")
            ))
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testing::ScriptedTransport;
    use serde_json::json;

    const GRAPH: &str = "https://graph.microsoft.com/v1.0";
    const USER_ID: &str = "68be84bf-a585-4776-80b3-30aa5207aa21";

    fn user() -> Value {
        json!({
            "id": USER_ID,
            "displayName": "Aarif Sherzai",
            "userPrincipalName": "AarifS@contoso.onmicrosoft.com",
            "mail": "AarifS@contoso.onmicrosoft.com"
        })
    }

    fn by_name(name: &str) -> UserGetOptions {
        UserGetOptions {
            user_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_exactly_one_key_required() {
        assert!(UserGetOptions::default().validate().is_err());

        let both = UserGetOptions {
            id: Some(USER_ID.to_string()),
            email: Some("a@contoso.com".to_string()),
            ..Default::default()
        };
        assert!(both.validate().is_err());

        let bad_id = UserGetOptions {
            id: Some("abc".to_string()),
            ..Default::default()
        };
        assert_eq!(bad_id.validate().unwrap_err().to_string(), "abc is not a valid GUID");

        assert!(by_name("a@contoso.com").validate().is_ok());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let transport = ScriptedTransport::new();
        transport.on_get(
            &format!("{GRAPH}/users?$filter=id eq '{USER_ID}'"),
            json!({ "value": [user()] }),
        );
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let options = UserGetOptions {
            id: Some(USER_ID.to_string()),
            ..Default::default()
        };
        assert_eq!(run(&ctx, &options).await.unwrap(), user());
    }

    #[tokio::test]
    async fn test_user_name_is_encoded_and_properties_selected() {
        let transport = ScriptedTransport::new();
        transport.on_get(
            &format!("{GRAPH}/users?$filter=userPrincipalName eq 'AarifS%40contoso.onmicrosoft.com'&$select=id,mail"),
            json!({ "value": [{ "id": USER_ID, "mail": null }] }),
        );
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let options = UserGetOptions {
            properties: Some("id, mail".to_string()),
            ..by_name("AarifS@contoso.onmicrosoft.com")
        };
        let output = run(&ctx, &options).await.unwrap();
        assert_eq!(output, json!({ "id": USER_ID, "mail": null }));
    }

    #[tokio::test]
    async fn test_user_not_found() {
        let transport = ScriptedTransport::new();
        transport.on_get(
            &format!("{GRAPH}/users?$filter=mail eq 'AarifS%40contoso.onmicrosoft.com'"),
            json!({ "value": [] }),
        );
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let options = UserGetOptions {
            email: Some("AarifS@contoso.onmicrosoft.com".to_string()),
            ..Default::default()
        };
        let err = run(&ctx, &options).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "The specified user with email AarifS@contoso.onmicrosoft.com does not exist"
        );
    }

    #[tokio::test]
    async fn test_multiple_users_found() {
        let transport = ScriptedTransport::new();
        transport.on_get(
            &format!("{GRAPH}/users?$filter=mail eq 'AarifS%40contoso.onmicrosoft.com'"),
            json!({
                "value": [
                    { "id": "9b1b1e42-794b-4c71-93ac-5ed92488b67f", "userPrincipalName": "AarifS@contoso.onmicrosoft.com" },
                    { "id": USER_ID, "userPrincipalName": "DebraB@contoso.onmicrosoft.com" }
                ]
            }),
        );
        let ctx = CommandContext::new(&transport, "https://graph.microsoft.com");

        let options = UserGetOptions {
            email: Some("AarifS@contoso.onmicrosoft.com".to_string()),
            ..Default::default()
        };
        let err = run(&ctx, &options).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<LookupError>(), Some(LookupError::Ambiguous(_))));
        assert_eq!(
            err.to_string(),
            "Multiple users with email AarifS@contoso.onmicrosoft.com found. Please disambiguate (user names): AarifS@contoso.onmicrosoft.com, DebraB@contoso.onmicrosoft.com or (ids): 9b1b1e42-794b-4c71-93ac-5ed92488b67f, 68be84bf-a585-4776-80b3-30aa5207aa21"
        );
    }
}
