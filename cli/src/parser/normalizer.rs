//! Row normalization.
//!
//! Turns a [`RawRow`] into a [`NormalizedRow`]: lower-cased field names and
//! the network/tag columns lifted into [`AccessGrant`]s. Values are never
//! rewritten here; access levels are compared case-insensitively later, at
//! validation time.

use std::collections::{HashMap, HashSet};

use super::RawRow;
use crate::error::FormatError;
use crate::models::{AccessGrant, GrantKind};

/// Every column name the input file may use (compared lower-cased).
pub const VALID_FIELDS: [&str; 9] = [
    "name",
    "email",
    "orgaccess",
    "orgid",
    "operation",
    "networkid",
    "networkaccess",
    "tag",
    "tagaccess",
];

/// Columns that identify an admin operation rather than add a grant.
const IDENTITY_FIELDS: [&str; 5] = ["orgid", "operation", "name", "email", "orgaccess"];

/// A row with canonical field names and extracted grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub ordinal: u64,
    pub line: u64,
    /// Non-grant columns keyed by lower-cased name.
    pub fields: HashMap<String, String>,
    pub network: Option<AccessGrant>,
    pub tag: Option<AccessGrant>,
}

impl NormalizedRow {
    /// Value of a column, or `None` when absent or blank.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Owned variant of [`NormalizedRow::field`].
    pub fn field_owned(&self, name: &str) -> Option<String> {
        self.field(name).map(String::from)
    }

    /// A row with blank orgid and operation only adds grants to the previous record.
    pub fn is_continuation(&self) -> bool {
        self.field("orgid").is_none() && self.field("operation").is_none()
    }

    /// First identity column that is filled in, if any.
    pub fn first_identity_field(&self) -> Option<&'static str> {
        IDENTITY_FIELDS.into_iter().find(|f| self.field(f).is_some())
    }

    /// Extracted grant of the given kind.
    pub fn grant(&self, kind: GrantKind) -> Option<&AccessGrant> {
        match kind {
            GrantKind::Network => self.network.as_ref(),
            GrantKind::Tag => self.tag.as_ref(),
        }
    }

    pub fn has_grant(&self) -> bool {
        self.network.is_some() || self.tag.is_some()
    }
}

/// Normalizer bound to one file's header row.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    /// Lower-cased header names, in column order.
    keys: Vec<String>,
}

impl RowNormalizer {
    /// Check every header name against [`VALID_FIELDS`].
    ///
    /// Any unknown or repeated name rejects the whole file.
    pub fn new(headers: &[String]) -> Result<Self, FormatError> {
        let mut seen = HashSet::new();
        let mut keys = Vec::with_capacity(headers.len());

        for header in headers {
            let key = header.trim().to_lowercase();
            if !VALID_FIELDS.contains(&key.as_str()) {
                return Err(FormatError::UnknownField(header.clone()));
            }
            if !seen.insert(key.clone()) {
                return Err(FormatError::DuplicateField(header.clone()));
            }
            keys.push(key);
        }

        Ok(Self { keys })
    }

    /// True when the header row contains the (lower-cased) field.
    pub fn has_field(&self, name: &str) -> bool {
        self.keys.iter().any(|k| k == name)
    }

    /// Normalize one row.
    pub fn normalize(&self, row: &RawRow) -> Result<NormalizedRow, FormatError> {
        let mut fields: HashMap<String, String> = self
            .keys
            .iter()
            .cloned()
            .zip(row.values.iter().cloned())
            .collect();

        let tag = take_grant(&mut fields, GrantKind::Tag)?;
        let network = take_grant(&mut fields, GrantKind::Network)?;

        Ok(NormalizedRow {
            ordinal: row.ordinal,
            line: row.line,
            fields,
            network,
            tag,
        })
    }
}

/// Remove a target/access column pair from the row and build a grant from it.
fn take_grant(
    fields: &mut HashMap<String, String>,
    kind: GrantKind,
) -> Result<Option<AccessGrant>, FormatError> {
    let target = fields.remove(kind.target_field()).unwrap_or_default();
    let access = fields.remove(kind.access_field()).unwrap_or_default();

    match (target.trim().is_empty(), access.trim().is_empty()) {
        (true, true) => Ok(None),
        (false, _) => Ok(Some(AccessGrant::new(target, access))),
        (true, false) => Err(FormatError::MalformedGrant {
            kind,
            reason: format!(
                "{} '{}' supplied without a {}",
                kind.access_field(),
                access,
                kind.target_field()
            ),
        }),
    }
}
