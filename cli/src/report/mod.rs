//! Console output and result logs.

pub mod logs;
pub mod results;

pub use logs::{log_error, log_info, log_success, log_warning, LogEntry, LogLevel, LOG_BROADCASTER};
pub use results::{classify, write_results, ClassifiedResults, ResultRow};

use crate::dispatch::{preflight, RunReport};
use crate::models::{AccessGrant, AdminRecord, OrgQueue};

fn grants_text(grants: &[AccessGrant]) -> String {
    grants
        .iter()
        .map(|grant| format!("{}={}", grant.target, grant.access))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line description of a queued record.
pub fn describe_record(record: &AdminRecord) -> String {
    let mut text = format!(
        "#{} {} {} <{}>",
        record.request_id,
        record.operation,
        record.name.as_deref().unwrap_or("-"),
        record.email.as_deref().unwrap_or("-"),
    );
    if let Some(access) = &record.org_access {
        text.push_str(&format!(" org:{access}"));
    }
    if !record.networks.is_empty() {
        text.push_str(&format!(" networks[{}]", grants_text(&record.networks)));
    }
    if !record.tags.is_empty() {
        text.push_str(&format!(" tags[{}]", grants_text(&record.tags)));
    }
    text
}

/// List the queue per organization, before asking for confirmation.
pub fn print_queue_summary(queue: &OrgQueue) {
    log_info(format!(
        "📋 {} record(s) across {} organization(s)",
        queue.record_count(),
        queue.len()
    ));
    for batch in queue.batches() {
        logs::log_info_indent(format!("🏢 {}", batch.org_id), 1);
        for record in &batch.records {
            logs::log_info_indent(describe_record(record), 2);
        }
    }
}

/// Run the offline checks for every record and print what would happen.
///
/// Returns the number of records that would fail before reaching the API.
pub fn print_dry_run(queue: &OrgQueue) -> usize {
    let mut failures = 0;
    for batch in queue.batches() {
        logs::log_info_indent(format!("🏢 {}", batch.org_id), 1);
        for record in &batch.records {
            match preflight(record) {
                Ok(operation) => logs::log_success_indent(
                    format!("{} would be sent as {operation}", describe_record(record)),
                    2,
                ),
                Err(error) => {
                    failures += 1;
                    logs::log_error_indent(format!("{}: {error}", describe_record(record)), 2);
                }
            }
        }
    }
    failures
}

/// Totals after dispatch.
pub fn print_run_summary(report: &RunReport) {
    let accepted = report.results().filter(|r| r.outcome.is_accepted()).count();
    let rejected = report.count("submitted") - accepted;

    log_info("📊 Summary");
    logs::log_success_indent(format!("Accepted: {accepted}"), 1);
    logs::log_info_indent(format!("Skipped: {}", report.count("skipped")), 1);
    if rejected > 0 {
        logs::log_error_indent(format!("Rejected by dashboard: {rejected}"), 1);
    }
    if report.count("failed") > 0 {
        logs::log_error_indent(format!("Failed: {}", report.count("failed")), 1);
    }
    if !report.is_complete() {
        logs::log_error_indent(format!("Unattempted: {}", report.unattempted_count()), 1);
        let orgs = report.unattempted_orgs();
        if !orgs.is_empty() {
            logs::log_error_indent(format!("Organizations not started: {}", orgs.join(", ")), 1);
        }
    }
    if report.timed_out {
        log_warning("Run stopped at the deadline");
    } else if report.aborted {
        log_warning("Run stopped after a transport failure");
    }
}
