//! Admin existence checks.
//!
//! An admin is found by scanning the organization's admin listing for an
//! entry whose email or ID equals the identifier (exact, case-sensitive).
//! Known limitation: identifiers are assumed unique per organization. If
//! the dashboard ever returns duplicates, the first entry in listing order
//! wins.

use crate::error::ApiResult;
use crate::models::AdminEntry;

use super::client::{ApiResponse, DashboardApi};

/// Read every admin from a listing response.
///
/// An empty or non-JSON body means the organization has no admins yet.
pub fn parse_admin_listing(response: &ApiResponse) -> Vec<AdminEntry> {
    match response.json() {
        Some(serde_json::Value::Array(items)) => {
            items.iter().filter_map(AdminEntry::from_value).collect()
        }
        _ => Vec::new(),
    }
}

/// First entry matching the identifier.
pub fn find_in_listing<'a>(entries: &'a [AdminEntry], identifier: &str) -> Option<&'a AdminEntry> {
    entries.iter().find(|entry| entry.matches(identifier))
}

/// One-shot lookup: a single listing request, no caching.
pub async fn find_admin<A>(api: &A, org_id: &str, identifier: &str) -> ApiResult<Option<AdminEntry>>
where
    A: DashboardApi + ?Sized,
{
    let response = api.list_admins(org_id).await?;
    let entries = parse_admin_listing(&response);
    Ok(find_in_listing(&entries, identifier).cloned())
}

/// Admin lookups for one organization during one dispatch pass.
///
/// The listing is fetched on first use and reused until [`invalidate`] is
/// called, which the dispatcher does after every mutating request.
///
/// [`invalidate`]: AdminDirectory::invalidate
pub struct AdminDirectory<'a, A: ?Sized> {
    api: &'a A,
    org_id: String,
    cached: Option<Vec<AdminEntry>>,
}

impl<'a, A> AdminDirectory<'a, A>
where
    A: DashboardApi + ?Sized,
{
    pub fn new(api: &'a A, org_id: impl Into<String>) -> Self {
        Self {
            api,
            org_id: org_id.into(),
            cached: None,
        }
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    /// Look an admin up by email or ID.
    pub async fn find_admin(&mut self, identifier: &str) -> ApiResult<Option<AdminEntry>> {
        if self.cached.is_none() {
            let response = self.api.list_admins(&self.org_id).await?;
            self.cached = Some(parse_admin_listing(&response));
        }

        Ok(self
            .cached
            .as_deref()
            .and_then(|entries| find_in_listing(entries, identifier))
            .cloned())
    }

    /// Drop the cached listing.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
