//! Name lookup over a fully fetched service principal directory.

use super::principal::ResourcePrincipal;
use std::collections::HashMap;

/// Separator that may trail a registered principal name
pub const NAME_SEPARATOR: char = '/';

/// Read-only index of principals by every name they are registered under.
///
/// Names are matched ignoring one trailing separator on either side, so a
/// principal registered as `Contoso.Api` is found for `Contoso.Api/` and one
/// registered as `https://contoso.com/` is found for `https://contoso.com`.
/// When several principals share a name, the one the server returned first
/// wins.
#[derive(Debug, Default)]
pub struct PrincipalIndex {
    principals: Vec<ResourcePrincipal>,
    by_name: HashMap<String, usize>,
}

impl PrincipalIndex {
    pub fn build(principals: Vec<ResourcePrincipal>) -> Self {
        let mut by_name = HashMap::new();
        for (position, principal) in principals.iter().enumerate() {
            for name in &principal.service_principal_names {
                by_name
                    .entry(normalize(name).to_string())
                    .or_insert(position);
            }
        }

        tracing::debug!(
            "Indexed {} principals under {} names",
            principals.len(),
            by_name.len()
        );

        Self {
            principals,
            by_name,
        }
    }

    /// Principal registered as `name` or `name/`.
    pub fn lookup(&self, name: &str) -> Option<&ResourcePrincipal> {
        self.by_name
            .get(normalize(name))
            .map(|&position| &self.principals[position])
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

fn normalize(name: &str) -> &str {
    name.strip_suffix(NAME_SEPARATOR).unwrap_or(name)
}
