//! Permission resolution
//!
//! Turns `<principal>/<permission>` requests into `requiredResourceAccess`
//! entries and merges delegated and application sets into one.

use super::index::{PrincipalIndex, NAME_SEPARATOR};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delegated (`Scope`) or application (`Role`) permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionKind {
    #[serde(rename = "Scope")]
    Delegated,
    #[serde(rename = "Role")]
    Application,
}

/// One granted permission on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAccess {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PermissionKind,
}

/// Permissions requested on a single resource application.
///
/// A resolved set holds at most one entry per `resource_app_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredResourceAccess {
    pub resource_app_id: String,
    pub resource_access: Vec<ResourceAccess>,
}

/// Resolution failures. Either one aborts the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Service principal {0} not found")]
    PrincipalNotFound(String),

    #[error("Permission {permission} for service principal {principal} not found")]
    PermissionNotFound {
        principal: String,
        permission: String,
    },
}

/// Split a request at the last separator: `(principal, permission)`.
///
/// Principal names may contain the separator themselves
/// (`https://contoso.com/api/Read` -> `https://contoso.com/api`, `Read`).
/// A request without separator has an empty principal name.
pub fn parse_request(request: &str) -> (&str, &str) {
    request.rsplit_once(NAME_SEPARATOR).unwrap_or(("", request))
}

/// Resolve a comma-separated list of permission requests of one kind.
///
/// Blank input resolves to an empty set.
pub fn resolve(
    index: &PrincipalIndex,
    requested: &str,
    kind: PermissionKind,
) -> Result<Vec<RequiredResourceAccess>, ResolveError> {
    let mut resolved: Vec<RequiredResourceAccess> = Vec::new();
    if requested.trim().is_empty() {
        return Ok(resolved);
    }

    for request in requested.split(',').map(str::trim) {
        let (principal_name, permission_name) = parse_request(request);
        tracing::debug!(
            "Resolving {} (principal: {}, permission: {})",
            request,
            principal_name,
            permission_name
        );

        let principal = index
            .lookup(principal_name)
            .ok_or_else(|| ResolveError::PrincipalNotFound(principal_name.to_string()))?;

        let scope = principal
            .find_scope(kind, permission_name)
            .ok_or_else(|| ResolveError::PermissionNotFound {
                principal: principal_name.to_string(),
                permission: permission_name.to_string(),
            })?;

        let access = ResourceAccess {
            id: scope.id.clone(),
            kind,
        };

        match resolved
            .iter_mut()
            .find(|entry| entry.resource_app_id == principal.resource_id())
        {
            Some(entry) => entry.resource_access.push(access),
            None => resolved.push(RequiredResourceAccess {
                resource_app_id: principal.resource_id().to_string(),
                resource_access: vec![access],
            }),
        }
    }

    Ok(resolved)
}

/// Merge `second` onto `first`.
///
/// Access items of a resource present in both are appended to the entry in
/// `first`; resources only in `second` are appended at the end, in order.
pub fn merge(
    mut first: Vec<RequiredResourceAccess>,
    second: Vec<RequiredResourceAccess>,
) -> Vec<RequiredResourceAccess> {
    for entry in second {
        match first
            .iter_mut()
            .find(|existing| existing.resource_app_id == entry.resource_app_id)
        {
            Some(existing) => existing.resource_access.extend(entry.resource_access),
            None => first.push(entry),
        }
    }
    first
}
