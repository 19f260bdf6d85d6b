//! Domain models for the admin provisioning pipeline.
//!
//! - [`AdminRecord`] - one normalized admin operation
//! - [`AccessGrant`] / [`GrantKind`] - network or tag scoped access
//! - [`Operation`] - closed set of supported operations
//! - [`OrgQueue`] / [`OrgBatch`] - records grouped per organization
//! - [`AdminEntry`] / [`Organization`] - entries read back from the dashboard

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Access Grants
// =============================================================================

/// Whether a grant targets a single network or a tag shared by networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantKind {
    Network,
    Tag,
}

impl GrantKind {
    /// Column holding the grant's target in the input file.
    pub fn target_field(&self) -> &'static str {
        match self {
            GrantKind::Network => "networkid",
            GrantKind::Tag => "tag",
        }
    }

    /// Column holding the grant's access level in the input file.
    pub fn access_field(&self) -> &'static str {
        match self {
            GrantKind::Network => "networkaccess",
            GrantKind::Tag => "tagaccess",
        }
    }

    /// Key naming the target in dashboard payloads.
    pub fn payload_key(&self) -> &'static str {
        match self {
            GrantKind::Network => "id",
            GrantKind::Tag => "tag",
        }
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantKind::Network => write!(f, "network"),
            GrantKind::Tag => write!(f, "tag"),
        }
    }
}

/// A single network or tag permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// Network ID (or name) for network grants, tag name for tag grants.
    pub target: String,
    /// Access level exactly as read from the file.
    pub access: String,
}

impl AccessGrant {
    pub fn new(target: impl Into<String>, access: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            access: access.into(),
        }
    }
}

// =============================================================================
// Operation
// =============================================================================

/// Supported admin operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Modify,
    Delete,
}

impl Operation {
    /// Parse the operation column. Returns `None` for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "add" => Some(Self::Add),
            "modify" => Some(Self::Modify),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Admin Record
// =============================================================================

/// A normalized unit of work built from one input row plus its continuations.
///
/// Blank columns are `None`; non-blank values are kept exactly as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    /// 1-based ordinal of the originating data row.
    pub request_id: u64,
    /// Physical line of the originating row in the input file.
    pub line: u64,
    /// Organization name or ID, as written in the file.
    pub org_id: String,
    /// Raw operation column; parsed at dispatch time.
    pub operation: String,
    pub name: Option<String>,
    /// Email, or numeric admin ID for modify/delete.
    pub email: Option<String>,
    pub org_access: Option<String>,
    pub networks: Vec<AccessGrant>,
    pub tags: Vec<AccessGrant>,
}

impl AdminRecord {
    /// Empty record for the given row position and organization.
    pub fn new(request_id: u64, line: u64, org_id: impl Into<String>) -> Self {
        Self {
            request_id,
            line,
            org_id: org_id.into(),
            operation: String::new(),
            name: None,
            email: None,
            org_access: None,
            networks: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn grants(&self, kind: GrantKind) -> &[AccessGrant] {
        match kind {
            GrantKind::Network => &self.networks,
            GrantKind::Tag => &self.tags,
        }
    }

    pub fn grants_mut(&mut self, kind: GrantKind) -> &mut Vec<AccessGrant> {
        match kind {
            GrantKind::Network => &mut self.networks,
            GrantKind::Tag => &mut self.tags,
        }
    }

    /// True when at least one network or tag grant is present.
    pub fn has_grants(&self) -> bool {
        !self.networks.is_empty() || !self.tags.is_empty()
    }

    /// Identifier used to look the admin up for modify/delete.
    pub fn identifier(&self) -> Option<&str> {
        self.email.as_deref()
    }
}

// =============================================================================
// Organization Queue
// =============================================================================

/// All records targeting one organization, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgBatch {
    pub org_id: String,
    pub records: Vec<AdminRecord>,
}

/// Records grouped by organization. Organizations keep first-seen order.
#[derive(Debug, Clone, Default)]
pub struct OrgQueue {
    batches: Vec<OrgBatch>,
    index: HashMap<String, usize>,
}

impl OrgQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to its organization. Returns `(org_index, record_index)`.
    pub fn push(&mut self, record: AdminRecord) -> (usize, usize) {
        let org_idx = match self.index.get(&record.org_id) {
            Some(&idx) => idx,
            None => {
                let idx = self.batches.len();
                self.index.insert(record.org_id.clone(), idx);
                self.batches.push(OrgBatch {
                    org_id: record.org_id.clone(),
                    records: Vec::new(),
                });
                idx
            }
        };
        let records = &mut self.batches[org_idx].records;
        records.push(record);
        (org_idx, records.len() - 1)
    }

    /// Mutable access to a previously pushed record.
    pub fn record_mut(&mut self, org_idx: usize, record_idx: usize) -> Option<&mut AdminRecord> {
        self.batches
            .get_mut(org_idx)
            .and_then(|batch| batch.records.get_mut(record_idx))
    }

    pub fn get(&self, org_id: &str) -> Option<&OrgBatch> {
        self.index.get(org_id).map(|&idx| &self.batches[idx])
    }

    pub fn batches(&self) -> &[OrgBatch] {
        &self.batches
    }

    /// Number of organizations.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Number of records across all organizations.
    pub fn record_count(&self) -> usize {
        self.batches.iter().map(|b| b.records.len()).sum()
    }
}

// =============================================================================
// Dashboard Entries
// =============================================================================

/// An admin as returned by the dashboard's admin listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEntry {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl AdminEntry {
    /// Read an entry from a listing element. The ID may be a string or a number.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = value_as_id(value.get("id")?)?;
        Some(Self {
            id,
            email: value.get("email").and_then(Value::as_str).map(String::from),
            name: value.get("name").and_then(Value::as_str).map(String::from),
        })
    }

    /// Exact match on email or ID.
    pub fn matches(&self, identifier: &str) -> bool {
        self.email.as_deref() == Some(identifier) || self.id == identifier
    }
}

/// An organization as returned by the organizations listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

impl Organization {
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            id: value_as_id(value.get("id")?)?,
            name: value.get("name").and_then(Value::as_str)?.to_string(),
        })
    }
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
