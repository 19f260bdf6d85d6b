//! Result log files.
//!
//! Every record ends up in exactly one of two CSV files:
//!
//! | outcome                         | file    | `outcome` column |
//! |---------------------------------|---------|------------------|
//! | submitted, HTTP 2xx             | success | `submitted`      |
//! | skipped                         | success | `skipped`        |
//! | submitted, any other status     | fail    | `submitted`      |
//! | failed                          | fail    | `failed`         |
//! | never started                   | fail    | `unattempted`    |

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::dispatch::{OrgReport, Outcome, RecordResult, RunReport};
use crate::error::ReportError;
use crate::models::AdminRecord;

/// One line of a result log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub request_id: u64,
    pub line: u64,
    pub org_id: String,
    pub operation: String,
    pub name: String,
    pub email: String,
    pub outcome: String,
    pub status: Option<u16>,
    pub detail: String,
    pub timestamp: String,
}

impl ResultRow {
    fn from_record(record: &AdminRecord, org: &OrgReport, timestamp: &str) -> Self {
        Self {
            request_id: record.request_id,
            line: record.line,
            org_id: org.resolved_id.clone().unwrap_or_else(|| org.org_id.clone()),
            operation: record.operation.clone(),
            name: record.name.clone().unwrap_or_default(),
            email: record.email.clone().unwrap_or_default(),
            outcome: String::new(),
            status: None,
            detail: String::new(),
            timestamp: timestamp.to_string(),
        }
    }

    fn from_result(result: &RecordResult, org: &OrgReport, timestamp: &str) -> Self {
        let mut row = Self::from_record(&result.record, org, timestamp);
        row.outcome = result.outcome.label().to_string();
        row.status = result.outcome.status();
        row.detail = match &result.outcome {
            Outcome::Submitted { body, .. } => body.clone(),
            Outcome::Skipped { reason } => reason.clone(),
            Outcome::Failed { error } => error.to_string(),
        };
        row
    }

    fn unattempted(record: &AdminRecord, org: &OrgReport, timestamp: &str) -> Self {
        let mut row = Self::from_record(record, org, timestamp);
        row.outcome = "unattempted".to_string();
        row.detail = "run stopped before this record".to_string();
        row
    }
}

/// Rows split by destination file, in queue order.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedResults {
    pub success: Vec<ResultRow>,
    pub fail: Vec<ResultRow>,
}

/// Sort every record of a run into the success or fail set.
pub fn classify(report: &RunReport, timestamp: &str) -> ClassifiedResults {
    let mut classified = ClassifiedResults::default();

    for org in &report.orgs {
        for result in &org.results {
            let row = ResultRow::from_result(result, org, timestamp);
            let success = match &result.outcome {
                Outcome::Skipped { .. } => true,
                outcome => outcome.is_accepted(),
            };
            if success {
                classified.success.push(row);
            } else {
                classified.fail.push(row);
            }
        }
        for record in &org.unattempted {
            classified.fail.push(ResultRow::unattempted(record, org, timestamp));
        }
    }

    classified
}

fn write_rows(path: &Path, rows: &[ResultRow]) -> Result<(), ReportError> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    if rows.is_empty() {
        // serialize() only emits headers with the first row
        writer.write_record([
            "request_id", "line", "org_id", "operation", "name", "email", "outcome", "status",
            "detail", "timestamp",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write both result logs. Returns `(success_rows, fail_rows)`.
pub fn write_results(
    report: &RunReport,
    success_path: &Path,
    fail_path: &Path,
) -> Result<(usize, usize), ReportError> {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let classified = classify(report, &timestamp);

    write_rows(success_path, &classified.success)?;
    write_rows(fail_path, &classified.fail)?;

    Ok((classified.success.len(), classified.fail.len()))
}
