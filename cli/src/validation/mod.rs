//! Permission validation for admin records.
//!
//! Pure predicates over closed vocabularies, run before any request is sent
//! for a record. Access values are compared after trimming and lower-casing;
//! errors always carry the value exactly as provided.
//!
//! | Check                            | Vocabulary / rule                              |
//! |----------------------------------|------------------------------------------------|
//! | [`validate_org_access`]          | full, read-only, none                          |
//! | [`validate_target_access`]       | full, read-only, none, monitor-only, guest-ambassador |
//! | [`validate_tag_or_network_list`] | identifier + access on every pair              |
//! | [`validate_grant_presence`]      | orgaccess none requires a network/tag grant    |
//!
//! `add` runs all four in that order ([`validate_add`]). `modify` only checks
//! what the row actually supplies ([`validate_modify`]); blank columns stay
//! unset so the dashboard leaves them untouched.

use crate::error::{FormatError, ValidationError, ValidationResult};
use crate::models::{AccessGrant, AdminRecord, GrantKind};

/// Allowed org-level access values.
pub const ORG_ACCESS_LEVELS: &[&str] = &["full", "read-only", "none"];

/// Allowed network/tag access values.
pub const TARGET_ACCESS_LEVELS: &[&str] =
    &["full", "read-only", "none", "monitor-only", "guest-ambassador"];

/// Canonical org access for a record with no orgaccess column value.
const SCOPED_ONLY_ACCESS: &str = "none";

fn lookup(value: &str, vocabulary: &'static [&'static str]) -> Option<&'static str> {
    let normalized = value.trim().to_lowercase();
    vocabulary.iter().copied().find(|v| *v == normalized)
}

/// Check an org-level access value. Returns the canonical spelling.
pub fn validate_org_access(value: &str) -> ValidationResult<&'static str> {
    lookup(value, ORG_ACCESS_LEVELS).ok_or_else(|| ValidationError::InvalidOrgPermissions {
        provided: value.to_string(),
        allowed: ORG_ACCESS_LEVELS,
    })
}

/// Check a network/tag access value. Returns the canonical spelling.
pub fn validate_target_access(value: &str) -> ValidationResult<&'static str> {
    lookup(value, TARGET_ACCESS_LEVELS).ok_or_else(|| ValidationError::InvalidNetTagPermissions {
        provided: value.to_string(),
        allowed: TARGET_ACCESS_LEVELS,
    })
}

/// Check that every pair names its target and carries a valid access level.
pub fn validate_tag_or_network_list(kind: GrantKind, grants: &[AccessGrant]) -> ValidationResult<()> {
    for grant in grants {
        if grant.target.trim().is_empty() {
            return Err(FormatError::MalformedGrant {
                kind,
                reason: format!("missing {}", kind.target_field()),
            }
            .into());
        }
        if grant.access.trim().is_empty() {
            return Err(FormatError::MalformedGrant {
                kind,
                reason: format!("'{}' has no {}", grant.target, kind.access_field()),
            }
            .into());
        }
        validate_target_access(&grant.access)?;
    }
    Ok(())
}

/// An admin whose org access is `none` must be granted something else.
///
/// A blank orgaccess counts as `none`.
pub fn validate_grant_presence(record: &AdminRecord) -> ValidationResult<()> {
    let scoped_only = record
        .org_access
        .as_deref()
        .map_or(true, |v| v.trim().eq_ignore_ascii_case(SCOPED_ONLY_ACCESS));

    if scoped_only && !record.has_grants() {
        return Err(ValidationError::NullPermission);
    }
    Ok(())
}

/// Full check for `add`. Returns the canonical org access to submit.
pub fn validate_add(record: &AdminRecord) -> ValidationResult<&'static str> {
    if record.name.is_none() {
        return Err(ValidationError::MissingField("name"));
    }
    if record.email.is_none() {
        return Err(ValidationError::MissingField("email"));
    }

    let org_access = match record.org_access.as_deref() {
        Some(value) => validate_org_access(value)?,
        None => SCOPED_ONLY_ACCESS,
    };
    validate_tag_or_network_list(GrantKind::Tag, &record.tags)?;
    validate_tag_or_network_list(GrantKind::Network, &record.networks)?;
    validate_grant_presence(record)?;

    Ok(org_access)
}

/// Check only the fields a `modify` row supplies.
///
/// Returns the canonical org access when one was given.
pub fn validate_modify(record: &AdminRecord) -> ValidationResult<Option<&'static str>> {
    let org_access = record.org_access.as_deref().map(validate_org_access).transpose()?;
    validate_tag_or_network_list(GrantKind::Tag, &record.tags)?;
    validate_tag_or_network_list(GrantKind::Network, &record.networks)?;
    Ok(org_access)
}
