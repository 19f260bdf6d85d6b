//! Organization reference resolution.
//!
//! The orgid column accepts a numeric organization ID or an organization
//! name. Names are matched exactly against one organizations listing per
//! run.

use tokio::sync::OnceCell;

use crate::error::{ApiResult, DispatchError, DispatchResult};
use crate::models::Organization;

use super::client::DashboardApi;

/// True for canonical (all-digit) organization IDs.
pub fn is_canonical_id(org_ref: &str) -> bool {
    !org_ref.is_empty() && org_ref.bytes().all(|b| b.is_ascii_digit())
}

/// Match a name against a listing.
pub fn match_org_name(orgs: &[Organization], name: &str) -> DispatchResult<String> {
    let ids: Vec<String> = orgs
        .iter()
        .filter(|org| org.name == name)
        .map(|org| org.id.clone())
        .collect();

    match ids.len() {
        0 => Err(DispatchError::OrgNotFound(name.to_string())),
        1 => Ok(ids.into_iter().next().unwrap_or_default()),
        _ => Err(DispatchError::AmbiguousOrg {
            name: name.to_string(),
            ids,
        }),
    }
}

/// Resolves organization references, fetching the listing at most once.
///
/// Shared by every organization worker of a run.
#[derive(Default)]
pub struct OrgResolver {
    listing: OnceCell<Vec<Organization>>,
}

impl OrgResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a reference to an organization ID.
    pub async fn resolve<A>(&self, api: &A, org_ref: &str) -> DispatchResult<String>
    where
        A: DashboardApi + ?Sized,
    {
        let org_ref = org_ref.trim();
        if is_canonical_id(org_ref) {
            return Ok(org_ref.to_string());
        }

        let orgs = self
            .listing
            .get_or_try_init(|| fetch_organizations(api))
            .await?;
        match_org_name(orgs, org_ref)
    }
}

async fn fetch_organizations<A>(api: &A) -> ApiResult<Vec<Organization>>
where
    A: DashboardApi + ?Sized,
{
    let response = api.list_organizations().await?;
    Ok(match response.json() {
        Some(serde_json::Value::Array(items)) => {
            items.iter().filter_map(Organization::from_value).collect()
        }
        _ => Vec::new(),
    })
}
