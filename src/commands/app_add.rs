//! `aad app add` - register a new Azure AD application

use super::{CommandContext, LookupError};
use crate::directory::{self, PermissionKind, RequiredResourceAccess};
use crate::graph::pager;
use crate::manifest::{self, LegacyManifest};
use crate::rc::{self, RcApp};
use crate::validation::split_list;
use anyhow::{bail, Context, Result};
use chrono::{Months, SecondsFormat, Utc};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Placeholder in `--uri` replaced by the new app id
const APP_ID_TOKEN: &str = "_appId_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    Spa,
    Web,
    #[value(name = "publicClient")]
    PublicClient,
}

impl Platform {
    /// Property of the application resource holding this platform's settings
    fn property(self) -> &'static str {
        match self {
            Platform::Spa => "spa",
            Platform::Web => "web",
            Platform::PublicClient => "publicClient",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeConsentBy {
    #[value(name = "admins")]
    Admins,
    #[value(name = "adminsAndUsers")]
    AdminsAndUsers,
}

#[derive(Debug, Clone, Default, Args)]
pub struct AppAddOptions {
    /// Name of the app
    #[arg(short, long)]
    pub name: Option<String>,

    /// Make the app available to other tenants
    #[arg(long)]
    pub multitenant: bool,

    /// Comma-separated redirect URIs, requires --platform
    #[arg(short, long)]
    pub redirect_uris: Option<String>,

    /// Platform the redirect URIs belong to
    #[arg(short, long, value_enum)]
    pub platform: Option<Platform>,

    /// Enable implicit flow for access and ID tokens
    #[arg(long)]
    pub implicit_flow: bool,

    /// Create a client secret valid for one year
    #[arg(short = 's', long)]
    pub with_secret: bool,

    /// Delegated permissions, e.g. `https://graph.microsoft.com/User.Read`
    #[arg(long)]
    pub apis_delegated: Option<String>,

    /// Application permissions, e.g. `https://graph.microsoft.com/Mail.Read`
    #[arg(long)]
    pub apis_application: Option<String>,

    /// Application ID URI; `_appId_` is replaced with the app id
    #[arg(short, long)]
    pub uri: Option<String>,

    /// Name of the scope to expose
    #[arg(long)]
    pub scope_name: Option<String>,

    /// Who can consent to the exposed scope
    #[arg(long, value_enum)]
    pub scope_consent_by: Option<ScopeConsentBy>,

    #[arg(long)]
    pub scope_admin_consent_display_name: Option<String>,

    #[arg(long)]
    pub scope_admin_consent_description: Option<String>,

    /// Azure portal manifest (JSON) to apply to the new app
    #[arg(long)]
    pub manifest: Option<String>,

    /// Record the new app in .m365rc.json
    #[arg(long)]
    pub save: bool,
}

impl AppAddOptions {
    /// Check option combinations; returns the parsed manifest if one was given
    pub fn validate(&self) -> Result<Option<LegacyManifest>> {
        if self.manifest.is_none() && self.name.is_none() {
            bail!("Specify either the name of the app to create or the manifest");
        }

        if self.redirect_uris.is_some() && self.platform.is_none() {
            bail!("When you specify redirectUris you also need to specify platform");
        }

        if self.scope_name.is_some() {
            if self.uri.is_none() {
                bail!("When you specify scopeName you also need to specify uri");
            }
            if self.scope_admin_consent_description.is_none() {
                bail!("When you specify scopeName you also need to specify scopeAdminConsentDescription");
            }
            if self.scope_admin_consent_display_name.is_none() {
                bail!("When you specify scopeName you also need to specify scopeAdminConsentDisplayName");
            }
        }

        let Some(raw) = self.manifest.as_deref() else {
            return Ok(None);
        };

        let manifest = match LegacyManifest::parse(raw) {
            Ok(manifest) => manifest,
            Err(e) => bail!("Error while parsing the specified manifest: {e}"),
        };

        if self.name.is_none() && manifest.name.is_none() {
            bail!("Specify the name of the app to create either through the 'name' option or the 'name' property in the manifest");
        }

        Ok(Some(manifest))
    }
}

/// Result printed after registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub app_id: String,
    pub object_id: String,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedApplication {
    id: String,
    app_id: String,
}

#[derive(Deserialize)]
struct Organization {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordCredential {
    secret_text: String,
}

pub async fn run(ctx: &CommandContext<'_>, options: &AppAddOptions) -> Result<AppInfo> {
    let manifest = options.validate()?;

    let apis = resolve_apis(ctx, options).await?;

    let display_name = options
        .name
        .clone()
        .or_else(|| manifest.as_ref().and_then(|m| m.name.clone()))
        .unwrap_or_default();
    let created = create_app_registration(ctx, options, &display_name, &apis).await?;

    let mut app = AppInfo {
        tenant_id: tenant_id(ctx).await?,
        app_id: created.app_id,
        object_id: created.id,
        secret: None,
    };

    if let Some(manifest) = manifest {
        update_app_from_manifest(ctx, &app, manifest).await?;
    }

    configure_uri(ctx, options, &app).await?;

    if options.with_secret {
        app.secret = Some(configure_secret(ctx, &app).await?);
    }

    if options.save {
        save_app_info(ctx, &app, &display_name);
    }

    Ok(app)
}

/// Resolve requested delegated and application permissions into one set
pub async fn resolve_apis(
    ctx: &CommandContext<'_>,
    options: &AppAddOptions,
) -> Result<Vec<RequiredResourceAccess>> {
    let delegated = options.apis_delegated.as_deref().unwrap_or_default();
    let application = options.apis_application.as_deref().unwrap_or_default();

    if delegated.trim().is_empty() && application.trim().is_empty() {
        return Ok(Vec::new());
    }

    ctx.progress("Resolving requested APIs...");

    let index = directory::load_index(
        ctx.transport,
        &ctx.endpoint,
        ctx.page_observer("service principals"),
    )
    .await?;

    let resolved_delegated = directory::resolve(&index, delegated, PermissionKind::Delegated)?;
    ctx.debug_json("Resolved delegated permissions", &resolved_delegated);

    let resolved_application =
        directory::resolve(&index, application, PermissionKind::Application)?;
    ctx.debug_json("Resolved application permissions", &resolved_application);

    let merged = directory::merge(resolved_delegated, resolved_application);
    ctx.debug_json("Merged delegated and application permissions", &merged);

    Ok(merged)
}

async fn create_app_registration(
    ctx: &CommandContext<'_>,
    options: &AppAddOptions,
    display_name: &str,
    apis: &[RequiredResourceAccess],
) -> Result<CreatedApplication> {
    let sign_in_audience = if options.multitenant {
        "AzureADMultipleOrgs"
    } else {
        "AzureADMyOrg"
    };

    let mut application = json!({
        "displayName": display_name,
        "signInAudience": sign_in_audience,
    });

    if !apis.is_empty() {
        application["requiredResourceAccess"] = serde_json::to_value(apis)?;
    }

    if let (Some(uris), Some(platform)) = (options.redirect_uris.as_deref(), options.platform) {
        application[platform.property()] = json!({ "redirectUris": split_list(uris) });
    }

    if options.implicit_flow {
        application["web"]["implicitGrantSettings"] = json!({
            "enableAccessTokenIssuance": true,
            "enableIdTokenIssuance": true
        });
    }

    ctx.progress("Creating Azure AD app registration...");

    let response = ctx
        .transport
        .post(&ctx.url("myorganization/applications"), &application)
        .await?;

    serde_json::from_value(response).context("Unexpected response when creating the app registration")
}

/// Tenant the app was created in: the signed-in user's organization
async fn tenant_id(ctx: &CommandContext<'_>) -> Result<String> {
    let page = pager::fetch_page::<Organization, _>(ctx.transport, &ctx.url("organization?$select=id")).await?;

    page.value
        .into_iter()
        .next()
        .map(|org| org.id)
        .ok_or_else(|| LookupError::NotFound("Could not determine the current tenant".to_string()).into())
}

async fn update_app_from_manifest(
    ctx: &CommandContext<'_>,
    app: &AppInfo,
    mut manifest: LegacyManifest,
) -> Result<()> {
    ctx.progress("Applying manifest to Azure AD app registration...");

    // the manifest may come from another app; never overwrite this one's identity
    manifest.strip_identity();
    let body = Value::Object(manifest::transform(manifest));

    ctx.transport
        .patch(&ctx.url(&format!("myorganization/applications/{}", app.object_id)), &body)
        .await?;

    Ok(())
}

async fn configure_uri(ctx: &CommandContext<'_>, options: &AppAddOptions, app: &AppInfo) -> Result<()> {
    let Some(uri) = options.uri.as_deref() else {
        return Ok(());
    };

    ctx.progress("Configuring Azure AD application ID URI...");

    let mut application = json!({
        "identifierUris": [uri.replace(APP_ID_TOKEN, &app.app_id)]
    });

    if let Some(scope_name) = options.scope_name.as_deref() {
        let consent_type = match options.scope_consent_by {
            Some(ScopeConsentBy::AdminsAndUsers) => "User",
            _ => "Admin",
        };

        application["api"] = json!({
            "oauth2PermissionScopes": [{
                "adminConsentDescription": options.scope_admin_consent_description,
                "adminConsentDisplayName": options.scope_admin_consent_display_name,
                "id": Uuid::new_v4().to_string(),
                "type": consent_type,
                "value": scope_name
            }]
        });
    }

    ctx.transport
        .patch(&ctx.url(&format!("myorganization/applications/{}", app.object_id)), &application)
        .await?;

    Ok(())
}

async fn configure_secret(ctx: &CommandContext<'_>, app: &AppInfo) -> Result<String> {
    ctx.progress("Configuring Azure AD app secret...");

    let expires = Utc::now()
        .checked_add_months(Months::new(12))
        .context("Failed to compute the secret expiration date")?;

    let body = json!({
        "passwordCredential": {
            "displayName": "Default",
            "endDateTime": expires.to_rfc3339_opts(SecondsFormat::Millis, true)
        }
    });

    let response = ctx
        .transport
        .post(
            &ctx.url(&format!("myorganization/applications/{}/addPassword", app.object_id)),
            &body,
        )
        .await?;

    let credential: PasswordCredential =
        serde_json::from_value(response).context("Unexpected response when adding the app secret")?;
    Ok(credential.secret_text)
}

/// Saving is best effort; failures are reported and otherwise ignored
fn save_app_info(ctx: &CommandContext<'_>, app: &AppInfo, name: &str) {
    let path = ctx.rc_path.display().to_string();
    ctx.progress(&format!(
        "Saving Azure AD app registration information to the {path} file..."
    ));

    let entry = RcApp::new(app.app_id.clone(), name);

    if let Err(e) = rc::record_app(&ctx.rc_path, entry) {
        tracing::warn!("Failed to save app info: {:#}", e);
        eprintln!("Error saving {path}: {e:#}. Please add app info to {path} manually.");
    }
}
