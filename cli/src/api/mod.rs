//! Dashboard API module.
//!
//! This module provides the HTTP client, admin lookups and organization
//! resolution used by the dispatcher.

pub mod client;
pub mod directory;
pub mod orgs;

#[cfg(test)]
pub mod fake;

pub use client::{ApiResponse, DashboardApi, HttpDashboard, API_KEY_HEADER};
pub use directory::{find_admin, find_in_listing, parse_admin_listing, AdminDirectory};
pub use orgs::{is_canonical_id, OrgResolver};
