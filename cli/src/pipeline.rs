//! High-level pipeline: input file → queue → dashboard → result logs.
//!
//! # Example
//!
//! ```rust,ignore
//! use dashboard_admins::{pipeline, HttpDashboard, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::new("admins.csv").with_api_key("secret").from_env()?;
//!     let queue = pipeline::load_queue(&config.csv_path)?;
//!     let api = HttpDashboard::new(&config.base_url, "secret", config.request_timeout)?;
//!     let report = pipeline::dispatch_queue(&api, &queue, config.dispatch_options()).await;
//!     pipeline::finish(&report, &config)?;
//!     std::process::exit(pipeline::exit_code(&report));
//! }
//! ```

use std::path::Path;

use crate::api::DashboardApi;
use crate::config::RunConfig;
use crate::dispatch::{DispatchOptions, Dispatcher, RunReport};
use crate::error::{IngestResult, RunResult};
use crate::models::OrgQueue;
use crate::parser::{open_csv, read_bytes};
use crate::queue::build_queue_from_reader;
use crate::report::{log_info, log_success, print_run_summary, write_results};

/// Run completed; per-record failures do not change this.
pub const EXIT_OK: i32 = 0;
/// Fatal ingestion or configuration error.
pub const EXIT_FATAL: i32 = 1;
/// Run aborted or timed out with records left unattempted.
pub const EXIT_INCOMPLETE: i32 = 2;

/// Read and queue an input file. Any error aborts with no partial queue.
pub fn load_queue<P: AsRef<Path>>(path: P) -> IngestResult<OrgQueue> {
    log_info(format!("📖 Reading {}", path.as_ref().display()));
    let queue = build_queue_from_reader(open_csv(path)?)?;
    log_success(format!(
        "Queued {} record(s) for {} organization(s)",
        queue.record_count(),
        queue.len()
    ));
    Ok(queue)
}

/// Same as [`load_queue`] for in-memory content.
pub fn load_queue_bytes(bytes: &[u8]) -> IngestResult<OrgQueue> {
    build_queue_from_reader(read_bytes(bytes)?)
}

/// Submit every queued record.
pub async fn dispatch_queue<A>(api: &A, queue: &OrgQueue, options: DispatchOptions) -> RunReport
where
    A: DashboardApi + ?Sized,
{
    log_info("🚀 Submitting requests...");
    Dispatcher::new(api, options).run(queue).await
}

/// Print the summary and write both result logs.
pub fn finish(report: &RunReport, config: &RunConfig) -> RunResult<()> {
    print_run_summary(report);
    let (success, fail) = write_results(report, &config.success_log, &config.fail_log)?;
    log_info(format!(
        "💾 {} row(s) written to {}, {} to {}",
        success,
        config.success_log.display(),
        fail,
        config.fail_log.display()
    ));
    Ok(())
}

/// Process exit status for a finished run.
pub fn exit_code(report: &RunReport) -> i32 {
    if (report.aborted || report.timed_out) && !report.is_complete() {
        EXIT_INCOMPLETE
    } else {
        EXIT_OK
    }
}
