//! Error types for the admin provisioning pipeline.
//!
//! Errors are split by the layer that raises them:
//!
//! - [`FormatError`] - structural problems in the input file
//! - [`IngestError`] - anything that aborts queue construction
//! - [`ValidationError`] - per-record permission checks
//! - [`ApiError`] - dashboard transport and response problems
//! - [`DispatchError`] - per-record failures during submission
//! - [`ConfigError`] / [`ReportError`] / [`RunError`] - binary-level plumbing
//!
//! Ingestion errors are fatal for the whole run. Validation and dispatch
//! errors are caught at the record boundary and never cross into siblings.

use thiserror::Error;

use crate::models::GrantKind;

// =============================================================================
// Format Errors
// =============================================================================

/// Structural problems with the input file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Header carries a field outside the allowed set.
    #[error("Unexpected field name '{0}'")]
    UnknownField(String),

    /// The same field appears twice in the header.
    #[error("Field '{0}' appears more than once in the header")]
    DuplicateField(String),

    /// Continuation row with nothing before it to attach to.
    #[error("Line {line}: continuation row has no preceding admin record")]
    OrphanContinuation { line: u64 },

    /// Continuation row that also fills identity or access columns.
    #[error("Line {line}: continuation rows may only carry network/tag columns (found '{field}')")]
    ContinuationWithIdentity { line: u64, field: String },

    /// Operation row with a blank orgid.
    #[error("Line {line}: orgid is empty")]
    EmptyOrgId { line: u64 },

    /// Network or tag pair that is missing one of its two parts.
    #[error("Invalid {kind} grant: {reason}")]
    MalformedGrant { kind: GrantKind, reason: String },
}

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors that abort queue construction. No partial queue is ever returned.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read the input.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The csv reader rejected the file.
    #[error("Invalid CSV format or non-CSV file provided (line {line}): {message}")]
    MalformedCsv { line: u64, message: String },

    /// The header row has no orgid column.
    #[error("Mandatory header orgid missing from CSV")]
    MissingMandatoryHeader,

    /// Structural error in headers or rows.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// No header row at all.
    #[error("CSV file is empty")]
    Empty,
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => IngestError::Io(io),
            _ => IngestError::MalformedCsv { line, message },
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Permission validation failures, raised before any request for the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Org-level access outside {full, read-only, none}.
    #[error("Org permissions must be one of {} (provided: '{provided}')", .allowed.join(", "))]
    InvalidOrgPermissions {
        provided: String,
        allowed: &'static [&'static str],
    },

    /// Network/tag access outside the target vocabulary.
    #[error("Network/tag permissions must be one of {} (provided: '{provided}')", .allowed.join(", "))]
    InvalidNetTagPermissions {
        provided: String,
        allowed: &'static [&'static str],
    },

    /// orgaccess is none and nothing else is granted.
    #[error("No org or network/tag level permissions supplied")]
    NullPermission,

    /// Malformed network/tag pair.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Field required by the operation is blank.
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
}

// =============================================================================
// API Errors
// =============================================================================

/// Dashboard API failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No HTTP response was received.
    #[error("HTTP transport failure: {0}")]
    Transport(String),

    /// Request (or the run deadline) timed out.
    #[error("Request timed out")]
    Timeout,

    /// A response arrived but could not be used.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// True when the failure happened below HTTP, i.e. no status was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Per-record failures. Recorded against the record's request ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Operation column outside {add, modify, delete}.
    #[error("Unknown operation '{operation}' (request {request_id})")]
    UnknownOperation { request_id: u64, operation: String },

    /// Permission validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Dashboard call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// modify/delete without an email or admin ID.
    #[error("No email or admin ID supplied to identify the admin")]
    MissingIdentifier,

    /// Organization name did not match any organization.
    #[error("Organization '{0}' not found")]
    OrgNotFound(String),

    /// Organization name matched several organizations.
    #[error("Organization name '{name}' is ambiguous (IDs: {})", .ids.join(", "))]
    AmbiguousOrg { name: String, ids: Vec<String> },
}

impl DispatchError {
    /// True when the record failed because the dashboard was unreachable.
    pub fn is_transport(&self) -> bool {
        matches!(self, DispatchError::Api(err) if err.is_transport())
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while assembling the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An API key is required unless running dry.
    #[error("An API key is required (pass it as the second argument)")]
    MissingApiKey,

    /// Environment variable present but unusable.
    #[error("Invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    /// reqwest refused the client settings.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while writing result logs.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to create or write a log file.
    #[error("Failed to write result log: {0}")]
    Io(#[from] std::io::Error),

    /// csv writer error.
    #[error("Failed to encode result log: {0}")]
    Csv(#[from] csv::Error),
}

// =============================================================================
// Run Errors (top-level)
// =============================================================================

/// Top-level errors returned to the binary.
#[derive(Debug, Error)]
pub enum RunError {
    /// Fatal ingestion error.
    #[error("{0}")]
    Ingest(#[from] IngestError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Result logs could not be written.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Confirmation prompt could not be shown.
    #[error("Confirmation prompt failed: {0}")]
    Prompt(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for permission validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for dashboard calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for per-record dispatch.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Result type for the binary.
pub type RunResult<T> = Result<T, RunError>;
