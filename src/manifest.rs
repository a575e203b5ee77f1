//! Application manifest conversion
//!
//! The Azure portal exports app registrations in its own (v2) manifest
//! format while the Graph `applications` endpoint expects the v1.6 resource
//! shape. [`transform`] maps one onto the other so an exported manifest can
//! be applied as a PATCH body.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Target document: a Graph `application` PATCH body.
pub type TargetManifest = Map<String, Value>;

/// Identity of the app the manifest was exported from. Never copied onto
/// a different application.
const IDENTITY_FIELDS: &[&str] = &["id", "appId", "publisherDomain"];

/// Portal-only properties without a Graph equivalent.
const UNSUPPORTED_FIELDS: &[&str] = &[
    "accessTokenAcceptedVersion",
    "disabledByMicrosoftStatus",
    "errorUrl",
    "oauth2RequirePostResponse",
    "oauth2AllowUrlPathMatching",
    "orgRestrictions",
    "samlMetadataUrl",
    // misspelled variant found in some exports
    "oauth2RequiredPostResponse",
];

/// Portal (v2) manifest.
///
/// Every property the conversion consumes has a field; anything else is
/// kept in `other` and passed through untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyManifest {
    pub accept_mapped_claims: Option<bool>,
    pub allow_public_client: Option<bool>,
    pub informational_urls: Option<InformationalUrls>,
    pub known_client_applications: Option<Vec<Value>>,
    pub logo_url: Option<String>,
    pub logout_url: Option<String>,
    pub name: Option<String>,
    pub oauth2_allow_implicit_flow: Option<bool>,
    pub oauth2_allow_id_token_implicit_flow: Option<bool>,
    pub oauth2_permissions: Option<Vec<Value>>,
    pub pre_authorized_applications: Option<Vec<Value>>,
    pub reply_urls_with_type: Option<Vec<ReplyUrl>>,
    pub sign_in_url: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InformationalUrls {
    pub terms_of_service: Option<String>,
    pub support: Option<String>,
    pub privacy: Option<String>,
    pub marketing: Option<String>,
}

/// Reply URL tagged with the platform it belongs to (`Web`, `Spa`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplyUrl {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl LegacyManifest {
    pub fn parse(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Drop the identity of the app the manifest was exported from.
    pub fn strip_identity(&mut self) {
        for field in IDENTITY_FIELDS {
            self.other.remove(*field);
        }
    }
}

/// Convert a portal manifest into a Graph `application` document.
///
/// Consumed properties only appear under their new name; a property absent
/// from the source is absent from the target too.
pub fn transform(legacy: LegacyManifest) -> TargetManifest {
    let LegacyManifest {
        accept_mapped_claims,
        allow_public_client,
        informational_urls,
        known_client_applications,
        logo_url,
        logout_url,
        name,
        oauth2_allow_implicit_flow,
        oauth2_allow_id_token_implicit_flow,
        oauth2_permissions,
        pre_authorized_applications,
        reply_urls_with_type,
        sign_in_url,
        other,
    } = legacy;

    let mut target = other;
    for field in UNSUPPORTED_FIELDS {
        target.remove(*field);
    }

    // parents must exist before any nested write
    object_mut(&mut target, "api");
    object_mut(&mut target, "info");
    let web = object_mut(&mut target, "web");
    object_mut(web, "implicitGrantSettings");
    array_mut(web, "redirectUris");
    array_mut(object_mut(&mut target, "spa"), "redirectUris");

    let api = object_mut(&mut target, "api");
    set_or_remove(api, "acceptMappedClaims", accept_mapped_claims.map(Value::Bool));
    set_or_remove(api, "knownClientApplications", known_client_applications.map(Value::Array));
    set_or_remove(api, "oauth2PermissionScopes", oauth2_permissions.map(Value::Array));
    set_or_remove(api, "preAuthorizedApplications", pre_authorized_applications.map(Value::Array));

    let urls = informational_urls.unwrap_or_default();
    let info = object_mut(&mut target, "info");
    set_or_remove(info, "termsOfServiceUrl", urls.terms_of_service.map(Value::String));
    set_or_remove(info, "supportUrl", urls.support.map(Value::String));
    set_or_remove(info, "privacyStatementUrl", urls.privacy.map(Value::String));
    set_or_remove(info, "marketingUrl", urls.marketing.map(Value::String));
    set_or_remove(info, "logoUrl", logo_url.map(Value::String));

    let web = object_mut(&mut target, "web");
    set_or_remove(web, "logoutUrl", logout_url.map(Value::String));
    set_or_remove(web, "homePageUrl", sign_in_url.map(Value::String));
    let grants = object_mut(web, "implicitGrantSettings");
    set_or_remove(grants, "enableAccessTokenIssuance", oauth2_allow_implicit_flow.map(Value::Bool));
    set_or_remove(grants, "enableIdTokenIssuance", oauth2_allow_id_token_implicit_flow.map(Value::Bool));

    let mut web_uris = Vec::new();
    let mut spa_uris = Vec::new();
    for reply_url in reply_urls_with_type.unwrap_or_default() {
        match reply_url.kind.as_str() {
            "Web" => web_uris.push(Value::String(reply_url.url)),
            "Spa" => spa_uris.push(Value::String(reply_url.url)),
            other => tracing::debug!("Dropping reply URL {} of type {}", reply_url.url, other),
        }
    }
    array_mut(object_mut(&mut target, "web"), "redirectUris").extend(web_uris);
    array_mut(object_mut(&mut target, "spa"), "redirectUris").extend(spa_uris);

    set_or_remove(&mut target, "publicClient", allow_public_client.map(Value::Bool));
    set_or_remove(&mut target, "displayName", name.map(Value::String));

    target
}

/// Object stored under `key`, created (or replacing a non-object) if needed.
fn object_mut<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(object) => object,
        _ => unreachable!("slot holds an object"),
    }
}

/// Array stored under `key`, created (or replacing a non-array) if needed.
fn array_mut<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let slot = map.entry(key).or_insert_with(|| Value::Array(Vec::new()));
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(array) => array,
        _ => unreachable!("slot holds an array"),
    }
}

fn set_or_remove(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            map.insert(key.to_string(), value);
        }
        None => {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert(value: Value) -> Value {
        let mut legacy = LegacyManifest::from_value(value).unwrap();
        legacy.strip_identity();
        Value::Object(transform(legacy))
    }

    #[test]
    fn test_name_becomes_display_name() {
        let target = convert(json!({ "name": "App1" }));
        assert_eq!(target["displayName"], "App1");
        assert!(target.get("name").is_none());
    }

    #[test]
    fn test_reply_urls_are_partitioned_by_platform() {
        let target = convert(json!({
            "replyUrlsWithType": [
                { "url": "https://a", "type": "Web" },
                { "url": "https://b", "type": "Spa" },
                { "url": "msal://c", "type": "InstalledClient" }
            ]
        }));

        assert_eq!(target["web"]["redirectUris"], json!(["https://a"]));
        assert_eq!(target["spa"]["redirectUris"], json!(["https://b"]));
        assert!(target.get("replyUrlsWithType").is_none());
    }

    #[test]
    fn test_empty_manifest_gets_default_objects() {
        let target = convert(json!({}));
        assert_eq!(
            target,
            json!({
                "api": {},
                "info": {},
                "web": { "implicitGrantSettings": {}, "redirectUris": [] },
                "spa": { "redirectUris": [] }
            })
        );
    }

    #[test]
    fn test_full_portal_manifest() {
        let target = convert(json!({
            "id": "95cfe30d-ed44-4f9d-b73d-c66560f72e83",
            "acceptMappedClaims": null,
            "accessTokenAcceptedVersion": 2,
            "addIns": [],
            "allowPublicClient": false,
            "appId": "ff254847-12c7-44cf-921e-8883dbd622a7",
            "appRoles": [],
            "oauth2AllowUrlPathMatching": false,
            "createdDateTime": "2020-12-22T08:40:38Z",
            "disabledByMicrosoftStatus": null,
            "errorUrl": null,
            "groupMembershipClaims": "SecurityGroup",
            "identifierUris": ["api://ff254847-12c7-44cf-921e-8883dbd622a7"],
            "informationalUrls": {
                "termsOfService": "https://contoso.com/tos",
                "support": null,
                "privacy": "https://contoso.com/privacy",
                "marketing": null
            },
            "keyCredentials": [],
            "knownClientApplications": ["dee84b5d-1a2e-4c89-ae6b-bb5e49e71c7f"],
            "logoUrl": null,
            "logoutUrl": "https://contoso.com/logout",
            "name": "My app",
            "oauth2AllowIdTokenImplicitFlow": true,
            "oauth2AllowImplicitFlow": false,
            "oauth2Permissions": [{
                "adminConsentDescription": "Access as a user",
                "id": "f1bd758f-4a1a-4b71-aa20-a248a22a8928",
                "isEnabled": true,
                "type": "User",
                "value": "access_as_a_user"
            }],
            "oauth2RequirePostResponse": false,
            "oauth2RequiredPostResponse": false,
            "optionalClaims": null,
            "orgRestrictions": [],
            "preAuthorizedApplications": [{
                "appId": "1fec8e78-bce4-4aaf-ab1b-5451cc387264",
                "permissionIds": ["f1bd758f-4a1a-4b71-aa20-a248a22a8928"]
            }],
            "publisherDomain": "contoso.onmicrosoft.com",
            "replyUrlsWithType": [{ "url": "https://contoso.com/auth", "type": "Web" }],
            "requiredResourceAccess": [],
            "samlMetadataUrl": null,
            "signInUrl": "https://contoso.com",
            "signInAudience": "AzureADMyOrg",
            "tags": []
        }));

        let expected = json!({
            "addIns": [],
            "api": {
                "knownClientApplications": ["dee84b5d-1a2e-4c89-ae6b-bb5e49e71c7f"],
                "oauth2PermissionScopes": [{
                    "adminConsentDescription": "Access as a user",
                    "id": "f1bd758f-4a1a-4b71-aa20-a248a22a8928",
                    "isEnabled": true,
                    "type": "User",
                    "value": "access_as_a_user"
                }],
                "preAuthorizedApplications": [{
                    "appId": "1fec8e78-bce4-4aaf-ab1b-5451cc387264",
                    "permissionIds": ["f1bd758f-4a1a-4b71-aa20-a248a22a8928"]
                }]
            },
            "appRoles": [],
            "createdDateTime": "2020-12-22T08:40:38Z",
            "displayName": "My app",
            "groupMembershipClaims": "SecurityGroup",
            "identifierUris": ["api://ff254847-12c7-44cf-921e-8883dbd622a7"],
            "info": {
                "termsOfServiceUrl": "https://contoso.com/tos",
                "privacyStatementUrl": "https://contoso.com/privacy"
            },
            "keyCredentials": [],
            "optionalClaims": null,
            "publicClient": false,
            "requiredResourceAccess": [],
            "signInAudience": "AzureADMyOrg",
            "spa": { "redirectUris": [] },
            "tags": [],
            "web": {
                "homePageUrl": "https://contoso.com",
                "implicitGrantSettings": {
                    "enableAccessTokenIssuance": false,
                    "enableIdTokenIssuance": true
                },
                "logoutUrl": "https://contoso.com/logout",
                "redirectUris": ["https://contoso.com/auth"]
            }
        });

        assert_eq!(target, expected);
    }

    #[test]
    fn test_existing_target_objects_are_extended() {
        let target = convert(json!({
            "web": { "redirectUris": ["https://existing"] },
            "api": { "requestedAccessTokenVersion": 2, "acceptMappedClaims": true },
            "replyUrlsWithType": [{ "url": "https://new", "type": "Web" }]
        }));

        assert_eq!(target["web"]["redirectUris"], json!(["https://existing", "https://new"]));
        assert_eq!(target["web"]["implicitGrantSettings"], json!({}));
        assert_eq!(target["api"], json!({ "requestedAccessTokenVersion": 2 }));
    }

    #[test]
    fn test_identity_fields_are_stripped() {
        let target = convert(json!({
            "id": "object-id",
            "appId": "app-id",
            "publisherDomain": "contoso.com",
            "name": "App"
        }));

        let object = target.as_object().unwrap();
        assert!(!object.contains_key("id"));
        assert!(!object.contains_key("appId"));
        assert!(!object.contains_key("publisherDomain"));
    }

    #[test]
    fn test_wrongly_typed_field_is_rejected() {
        assert!(LegacyManifest::parse(r#"{ "allowPublicClient": "yes" }"#).is_err());
        assert!(LegacyManifest::parse("not json").is_err());
    }
}
