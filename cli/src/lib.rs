//! # dashboard-admins - bulk administrator provisioning for a cloud network dashboard
//!
//! Reads a CSV of admin requests (add, modify, delete) spread across
//! organizations and submits them to the dashboard's admin endpoints.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│    Queue    │────▶│  Dispatcher │
//! │  (ISO/UTF8) │     │ (normalize) │     │ (per org)   │     │ (validate + │
//! └─────────────┘     └─────────────┘     └─────────────┘     │  dashboard) │
//!                                                             └──────┬──────┘
//!                                                                    ▼
//!                                                             result logs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dashboard_admins::{pipeline, DispatchOptions, HttpDashboard};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let queue = pipeline::load_queue("admins.csv").unwrap();
//!     let api = HttpDashboard::new(
//!         "https://dashboard.meraki.com/api/v0",
//!         "api-key",
//!         Duration::from_secs(30),
//!     )
//!     .unwrap();
//!     let report = pipeline::dispatch_queue(&api, &queue, DispatchOptions::default()).await;
//!     println!("{} submitted", report.count("submitted"));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Layered error types
//! - [`config`] - Run configuration
//! - [`models`] - Admin records, grants and the per-organization queue
//! - [`parser`] - CSV reading and row normalization
//! - [`queue`] - Queue construction with continuation rows
//! - [`validation`] - Permission validation
//! - [`api`] - Dashboard client, admin lookups, organization resolution
//! - [`dispatch`] - Per-organization submission
//! - [`report`] - Console logs and result files
//! - [`pipeline`] - End-to-end helpers used by the binary

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Ingestion
pub mod parser;
pub mod queue;

// Validation
pub mod validation;

// Dashboard
pub mod api;
pub mod dispatch;

// Output
pub mod pipeline;
pub mod report;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ApiError, ConfigError, DispatchError, FormatError, IngestError, ReportError, RunError,
    ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{AccessGrant, AdminEntry, AdminRecord, GrantKind, Operation, OrgBatch, OrgQueue};

// =============================================================================
// Re-exports - Ingestion
// =============================================================================

pub use parser::{open_csv, read_bytes, RawRow, RowNormalizer, RowReader, VALID_FIELDS};
pub use queue::{build_queue, QueueBuilder};

// =============================================================================
// Re-exports - Dashboard
// =============================================================================

pub use api::{AdminDirectory, ApiResponse, DashboardApi, HttpDashboard, OrgResolver};
pub use dispatch::{preflight, DispatchOptions, Dispatcher, Outcome, RecordResult, RunReport};

// =============================================================================
// Re-exports - Config & Output
// =============================================================================

pub use config::RunConfig;
pub use report::{print_queue_summary, print_run_summary, write_results};
