//! Directory lookups used when registering applications
//!
//! - [`principal`] - Service principal wire model
//! - [`index`] - Name lookup over the fetched principal directory
//! - [`permissions`] - Resolution and merge of requested API permissions

pub mod index;
pub mod permissions;
pub mod principal;

pub use index::PrincipalIndex;
pub use permissions::{
    merge, resolve, PermissionKind, RequiredResourceAccess, ResolveError, ResourceAccess,
};
pub use principal::{PermissionScope, ResourcePrincipal};

use crate::graph::client::api_url;
use crate::graph::pager::{self, PageProgress};
use crate::graph::{GraphResult, Transport};

/// Fetch every service principal of the tenant and index it by name.
pub async fn load_index<Tr, F>(transport: &Tr, endpoint: &str, on_page: F) -> GraphResult<PrincipalIndex>
where
    Tr: Transport + ?Sized,
    F: FnMut(&PageProgress),
{
    let url = api_url(endpoint, principal::SERVICE_PRINCIPALS_QUERY);
    let principals: Vec<ResourcePrincipal> =
        pager::fetch_all_with_progress(transport, &url, on_page).await?;

    Ok(PrincipalIndex::build(principals))
}
