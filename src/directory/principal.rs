//! Service principal records as returned by the directory.

use super::permissions::PermissionKind;
use serde::{Deserialize, Serialize};

/// Directory query feeding the lookup index; only the fields resolution needs.
pub const SERVICE_PRINCIPALS_QUERY: &str =
    "myorganization/servicePrincipals?$select=servicePrincipalNames,appId,oauth2PermissionScopes,appRoles";

/// A registered API surface exposing delegated scopes and application roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePrincipal {
    pub app_id: String,
    /// Names the principal is known by, e.g. `https://graph.microsoft.com/`
    #[serde(default)]
    pub service_principal_names: Vec<String>,
    /// Delegated permissions
    #[serde(default)]
    pub oauth2_permission_scopes: Vec<PermissionScope>,
    /// Application permissions
    #[serde(default)]
    pub app_roles: Vec<PermissionScope>,
}

/// Scope or role descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionScope {
    pub id: String,
    /// Permission name, e.g. `User.Read`. Some roles carry no value.
    #[serde(default)]
    pub value: Option<String>,
}

impl ResourcePrincipal {
    /// Identifier written into `requiredResourceAccess`
    pub fn resource_id(&self) -> &str {
        &self.app_id
    }

    /// Scope list for the requested permission kind
    pub fn scopes(&self, kind: PermissionKind) -> &[PermissionScope] {
        match kind {
            PermissionKind::Delegated => &self.oauth2_permission_scopes,
            PermissionKind::Application => &self.app_roles,
        }
    }

    /// Find a scope of `kind` by its name
    pub fn find_scope(&self, kind: PermissionKind, name: &str) -> Option<&PermissionScope> {
        self.scopes(kind)
            .iter()
            .find(|scope| scope.value.as_deref() == Some(name))
    }
}
