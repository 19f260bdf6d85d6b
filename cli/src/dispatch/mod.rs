//! Operation dispatch.
//!
//! Drains an [`OrgQueue`] against the dashboard. Each organization is handled
//! by its own submitter, which processes that organization's records one at a
//! time in file order. Submitters for different organizations may overlap
//! when `org_concurrency > 1`; results are always reported in queue order.
//!
//! ```text
//! OrgQueue ──▶ resolve org ──▶ for each record:
//!                               parse op ─▶ validate ─▶ lookup ─▶ mutate
//!                                                                  │
//!                                          invalidate listing ◀────┘
//! ```
//!
//! Per-record failures are captured as [`Outcome::Failed`] and never stop the
//! siblings. A transport failure (no HTTP response) stops the whole run when
//! `abort_on_transport_error` is set; every record not yet started is then
//! reported as unattempted. The same happens when the run deadline passes.

pub mod payload;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::{AdminDirectory, DashboardApi, OrgResolver};
use crate::error::{ApiError, DispatchError, DispatchResult};
use crate::models::{AdminRecord, OrgBatch, OrgQueue, Operation};
use crate::report::logs::{log_error, log_error_indent, log_info, log_info_indent, log_success_indent};
use crate::validation::{validate_add, validate_modify};

// =============================================================================
// Outcomes
// =============================================================================

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A mutating request was sent and answered. The status is reported as-is.
    Submitted {
        status: u16,
        /// ID of the created or targeted admin, when known.
        admin_id: Option<String>,
        body: String,
    },
    /// Nothing to do, e.g. the admin to modify or delete does not exist.
    Skipped { reason: String },
    /// The record could not be submitted.
    Failed { error: DispatchError },
}

impl Outcome {
    /// Short label used in logs and result files.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Submitted { .. } => "submitted",
            Outcome::Skipped { .. } => "skipped",
            Outcome::Failed { .. } => "failed",
        }
    }

    /// HTTP status of the mutating request, if one was answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Submitted { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a submitted request answered with 2xx.
    pub fn is_accepted(&self) -> bool {
        self.status().is_some_and(|status| (200..300).contains(&status))
    }
}

/// Outcome tagged with the record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResult {
    pub record: AdminRecord,
    pub outcome: Outcome,
}

/// Everything that happened to one organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgReport {
    /// Organization reference as written in the file.
    pub org_id: String,
    /// Canonical ID, once resolved.
    pub resolved_id: Option<String>,
    pub results: Vec<RecordResult>,
    /// Records never started because the run stopped.
    pub unattempted: Vec<AdminRecord>,
}

impl OrgReport {
    fn new(org_id: &str) -> Self {
        Self {
            org_id: org_id.to_string(),
            ..Self::default()
        }
    }

    /// True when no record of this organization was started.
    pub fn never_started(&self) -> bool {
        self.results.is_empty() && !self.unattempted.is_empty()
    }
}

/// Result of a full dispatch pass, in queue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub orgs: Vec<OrgReport>,
    /// A transport failure stopped the run.
    pub aborted: bool,
    /// The run deadline passed.
    pub timed_out: bool,
}

impl RunReport {
    pub fn results(&self) -> impl Iterator<Item = &RecordResult> {
        self.orgs.iter().flat_map(|org| org.results.iter())
    }

    pub fn unattempted(&self) -> impl Iterator<Item = &AdminRecord> {
        self.orgs.iter().flat_map(|org| org.unattempted.iter())
    }

    /// Number of results carrying the given outcome label.
    pub fn count(&self, label: &str) -> usize {
        self.results().filter(|r| r.outcome.label() == label).count()
    }

    pub fn unattempted_count(&self) -> usize {
        self.unattempted().count()
    }

    /// Organizations none of whose records were started.
    pub fn unattempted_orgs(&self) -> Vec<&str> {
        self.orgs
            .iter()
            .filter(|org| org.never_started())
            .map(|org| org.org_id.as_str())
            .collect()
    }

    /// True when every record was attempted.
    pub fn is_complete(&self) -> bool {
        self.unattempted_count() == 0
    }
}

// =============================================================================
// Options
// =============================================================================

/// Run controls for a dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Organizations processed at the same time. Values below 1 mean 1.
    pub org_concurrency: usize,
    /// Overall deadline for the pass.
    pub timeout: Option<Duration>,
    /// Stop everything after the first transport failure.
    pub abort_on_transport_error: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            org_concurrency: 1,
            timeout: None,
            abort_on_transport_error: true,
        }
    }
}

// =============================================================================
// Static checks
// =============================================================================

/// Checks a record without contacting the dashboard.
///
/// Used for dry runs. Mirrors the order of checks done at dispatch time,
/// except that modify/delete existence cannot be known offline.
pub fn preflight(record: &AdminRecord) -> DispatchResult<Operation> {
    let operation = parse_operation(record)?;
    match operation {
        Operation::Add => {
            validate_add(record)?;
        }
        Operation::Modify => {
            record.identifier().ok_or(DispatchError::MissingIdentifier)?;
            validate_modify(record)?;
        }
        Operation::Delete => {
            record.identifier().ok_or(DispatchError::MissingIdentifier)?;
        }
    }
    Ok(operation)
}

fn parse_operation(record: &AdminRecord) -> DispatchResult<Operation> {
    Operation::parse(&record.operation).ok_or_else(|| DispatchError::UnknownOperation {
        request_id: record.request_id,
        operation: record.operation.clone(),
    })
}

fn created_id(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Submits queued records to the dashboard.
pub struct Dispatcher<'a, A: ?Sized> {
    api: &'a A,
    options: DispatchOptions,
    resolver: OrgResolver,
    aborted: AtomicBool,
    timed_out: AtomicBool,
}

impl<'a, A> Dispatcher<'a, A>
where
    A: DashboardApi + ?Sized,
{
    pub fn new(api: &'a A, options: DispatchOptions) -> Self {
        Self {
            api,
            options,
            resolver: OrgResolver::new(),
            aborted: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
        }
    }

    /// Process the whole queue.
    pub async fn run(&self, queue: &OrgQueue) -> RunReport {
        let deadline = self.options.timeout.map(|timeout| Instant::now() + timeout);
        let concurrency = self.options.org_concurrency.max(1);

        let orgs = stream::iter(queue.batches())
            .map(|batch| self.submit_org(batch, deadline))
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await;

        RunReport {
            orgs,
            aborted: self.aborted.load(Ordering::SeqCst),
            timed_out: self.timed_out.load(Ordering::SeqCst),
        }
    }

    /// Process one organization's records in file order.
    pub async fn submit_org(&self, batch: &OrgBatch, deadline: Option<Instant>) -> OrgReport {
        let mut report = OrgReport::new(&batch.org_id);

        if self.should_stop(deadline) {
            report.unattempted = batch.records.clone();
            return report;
        }

        log_info(format!(
            "🏢 Organization {} ({} record(s))",
            batch.org_id,
            batch.records.len()
        ));

        let org_id = match self
            .within(deadline, self.resolver.resolve(self.api, &batch.org_id))
            .await
        {
            Ok(org_id) => org_id,
            Err(error) => {
                log_error_indent(format!("Cannot resolve organization: {error}"), 1);
                self.note_failure(&error);
                if error.is_transport() && self.stopped() {
                    report.unattempted = batch.records.clone();
                    return report;
                }
                report.results = batch
                    .records
                    .iter()
                    .map(|record| RecordResult {
                        record: record.clone(),
                        outcome: Outcome::Failed { error: error.clone() },
                    })
                    .collect();
                return report;
            }
        };
        report.resolved_id = Some(org_id.clone());

        let mut directory = AdminDirectory::new(self.api, org_id);
        let mut records = batch.records.iter();
        while let Some(record) = records.next() {
            if self.should_stop(deadline) {
                report.unattempted.push(record.clone());
                report.unattempted.extend(records.cloned());
                break;
            }

            let outcome = match self
                .within(deadline, self.dispatch_record(&mut directory, record))
                .await
            {
                Ok(outcome) => outcome,
                Err(error) => Outcome::Failed { error },
            };
            log_outcome(record, &outcome);
            if let Outcome::Failed { error } = &outcome {
                self.note_failure(error);
            }
            report.results.push(RecordResult {
                record: record.clone(),
                outcome,
            });
        }

        report
    }

    /// Dispatch a single record. Failures are returned, not raised.
    pub async fn dispatch_record(
        &self,
        directory: &mut AdminDirectory<'a, A>,
        record: &AdminRecord,
    ) -> DispatchResult<Outcome> {
        match parse_operation(record)? {
            Operation::Add => self.add(directory, record).await,
            Operation::Modify => self.modify(directory, record).await,
            Operation::Delete => self.delete(directory, record).await,
        }
    }

    async fn add(
        &self,
        directory: &mut AdminDirectory<'a, A>,
        record: &AdminRecord,
    ) -> DispatchResult<Outcome> {
        let org_access = validate_add(record)?;
        let body = payload::add_payload(record, org_access)?;

        let response = self.api.create_admin(directory.org_id(), &body).await?;
        directory.invalidate();

        Ok(Outcome::Submitted {
            status: response.status,
            admin_id: created_id(&response.body),
            body: response.body,
        })
    }

    async fn modify(
        &self,
        directory: &mut AdminDirectory<'a, A>,
        record: &AdminRecord,
    ) -> DispatchResult<Outcome> {
        let identifier = record.identifier().ok_or(DispatchError::MissingIdentifier)?;
        let Some(admin) = directory.find_admin(identifier).await? else {
            return Ok(Outcome::Skipped {
                reason: format!("admin '{identifier}' not found"),
            });
        };

        let org_access = validate_modify(record)?;
        let body = payload::update_payload(&admin.id, record, org_access)?;

        let response = self
            .api
            .update_admin(directory.org_id(), &admin.id, &body)
            .await?;
        directory.invalidate();

        Ok(Outcome::Submitted {
            status: response.status,
            admin_id: Some(admin.id),
            body: response.body,
        })
    }

    async fn delete(
        &self,
        directory: &mut AdminDirectory<'a, A>,
        record: &AdminRecord,
    ) -> DispatchResult<Outcome> {
        let identifier = record.identifier().ok_or(DispatchError::MissingIdentifier)?;
        let Some(admin) = directory.find_admin(identifier).await? else {
            return Ok(Outcome::Skipped {
                reason: format!("admin '{identifier}' not found"),
            });
        };

        let response = self.api.delete_admin(directory.org_id(), &admin.id).await?;
        directory.invalidate();

        Ok(Outcome::Submitted {
            status: response.status,
            admin_id: Some(admin.id),
            body: response.body,
        })
    }

    /// Run a future against the deadline. Elapsing counts as a timeout.
    async fn within<T, F>(&self, deadline: Option<Instant>, fut: F) -> DispatchResult<T>
    where
        F: Future<Output = DispatchResult<T>>,
    {
        let Some(deadline) = deadline else {
            return fut.await;
        };
        match tokio::time::timeout_at(deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                self.timed_out.store(true, Ordering::SeqCst);
                Err(DispatchError::Api(ApiError::Timeout))
            }
        }
    }

    /// True once the run was aborted or hit its deadline.
    fn stopped(&self) -> bool {
        self.aborted.load(Ordering::SeqCst) || self.timed_out.load(Ordering::SeqCst)
    }

    fn should_stop(&self, deadline: Option<Instant>) -> bool {
        if self.stopped() {
            return true;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            log_error("⏱️ Run deadline reached, remaining records left unattempted");
            self.timed_out.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }

    fn note_failure(&self, error: &DispatchError) {
        if self.timed_out.load(Ordering::SeqCst) {
            return;
        }
        if error.is_transport()
            && self.options.abort_on_transport_error
            && !self.aborted.swap(true, Ordering::SeqCst)
        {
            log_error(format!(
                "Dashboard unreachable ({error}), abandoning remaining records"
            ));
        }
    }
}

fn log_outcome(record: &AdminRecord, outcome: &Outcome) {
    let subject = record.identifier().unwrap_or("<no identifier>");
    let prefix = format!("#{} {} {}", record.request_id, record.operation, subject);
    match outcome {
        Outcome::Submitted { status, .. } if outcome.is_accepted() => {
            log_success_indent(format!("{prefix}: HTTP {status}"), 1)
        }
        Outcome::Submitted { status, body, .. } => {
            log_error_indent(format!("{prefix}: HTTP {status} {body}"), 1)
        }
        Outcome::Skipped { reason } => log_info_indent(format!("{prefix}: skipped, {reason}"), 1),
        Outcome::Failed { error } => log_error_indent(format!("{prefix}: {error}"), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeDashboard, Request};
    use crate::error::ValidationError;
    use crate::models::AccessGrant;
    use crate::pipeline::{exit_code, EXIT_INCOMPLETE, EXIT_OK};
    use serde_json::json;

    fn record(request_id: u64, org: &str, op: &str, email: &str) -> AdminRecord {
        let mut record = AdminRecord::new(request_id, request_id + 1, org);
        record.operation = op.into();
        record.email = Some(email.into());
        record
    }

    fn add(request_id: u64, org: &str, email: &str, access: &str) -> AdminRecord {
        let mut record = record(request_id, org, "add", email);
        record.name = Some("Admin".into());
        record.org_access = Some(access.into());
        record
    }

    fn queue(records: Vec<AdminRecord>) -> OrgQueue {
        let mut queue = OrgQueue::new();
        for record in records {
            queue.push(record);
        }
        queue
    }

    fn outcomes(report: &RunReport) -> Vec<(u64, &'static str)> {
        report
            .results()
            .map(|r| (r.record.request_id, r.outcome.label()))
            .collect()
    }

    #[tokio::test]
    async fn test_add_sends_exact_payload() {
        let api = FakeDashboard::new();
        let mut record = add(1, "123", "a@x.com", "full");
        record.name = Some("A".into());

        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![record]))
            .await;

        assert_eq!(
            api.mutating_requests(),
            vec![Request::Create(
                "123".into(),
                json!({"name": "A", "email": "a@x.com", "orgAccess": "full"})
            )]
        );
        assert_eq!(report.count("submitted"), 1);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_delete_of_missing_admin_is_skipped() {
        let api = FakeDashboard::new().with_admin("123", "9", "someone@x.com");
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![record(1, "123", "delete", "ghost@x.com")]))
            .await;

        assert_eq!(outcomes(&report), vec![(1, "skipped")]);
        assert!(api.mutating_requests().is_empty());
    }

    #[tokio::test]
    async fn test_delete_targets_listed_id() {
        let api = FakeDashboard::new().with_admin("123", "9", "a@x.com");
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![record(1, "123", "DELETE", "a@x.com")]))
            .await;

        assert_eq!(api.mutating_requests(), vec![Request::Delete("123".into(), "9".into())]);
        let result = report.results().next().unwrap();
        assert_eq!(result.outcome.status(), Some(204));
    }

    #[tokio::test]
    async fn test_unknown_operation_does_not_stop_siblings() {
        let api = FakeDashboard::new();
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                record(1, "123", "rename", "a@x.com"),
                add(2, "123", "b@x.com", "read-only"),
            ]))
            .await;

        assert_eq!(outcomes(&report), vec![(1, "failed"), (2, "submitted")]);
        let first = report.results().next().unwrap();
        assert_eq!(
            first.outcome,
            Outcome::Failed {
                error: DispatchError::UnknownOperation {
                    request_id: 1,
                    operation: "rename".into()
                }
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_permission_fails_before_any_request() {
        let api = FakeDashboard::new();
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![add(1, "123", "a@x.com", "admin")]))
            .await;

        let result = report.results().next().unwrap();
        assert!(matches!(
            &result.outcome,
            Outcome::Failed {
                error: DispatchError::Validation(ValidationError::InvalidOrgPermissions { .. })
            }
        ));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_scoped_add_carries_grants() {
        let api = FakeDashboard::new();
        let mut scoped = add(1, "123", "a@x.com", "none");
        scoped.networks.push(AccessGrant::new("N_1", "read-only"));

        Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![scoped]))
            .await;

        match &api.mutating_requests()[0] {
            Request::Create(_, body) => {
                assert_eq!(body["networks"], json!([{"id": "N_1", "access": "read-only"}]));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_modify_of_missing_admin_skips_validation() {
        let api = FakeDashboard::new();
        let mut modify = record(1, "123", "modify", "ghost@x.com");
        modify.org_access = Some("bogus".into());

        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![modify]))
            .await;

        assert_eq!(outcomes(&report), vec![(1, "skipped")]);
    }

    #[tokio::test]
    async fn test_modify_sends_only_supplied_fields() {
        let api = FakeDashboard::new().with_admin("123", "9", "a@x.com");
        let mut modify = record(1, "123", "modify", "a@x.com");
        modify.org_access = Some("Read-Only".into());

        Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![modify]))
            .await;

        assert_eq!(
            api.mutating_requests(),
            vec![Request::Update(
                "123".into(),
                "9".into(),
                json!({"id": "9", "orgAccess": "read-only"})
            )]
        );
    }

    #[tokio::test]
    async fn test_missing_identifier_fails() {
        let api = FakeDashboard::new();
        let mut delete = record(1, "123", "delete", "");
        delete.email = None;

        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![delete]))
            .await;

        let result = report.results().next().unwrap();
        assert_eq!(
            result.outcome,
            Outcome::Failed { error: DispatchError::MissingIdentifier }
        );
    }

    #[tokio::test]
    async fn test_listing_memoized_until_mutation() {
        let api = FakeDashboard::new()
            .with_admin("123", "1", "a@x.com")
            .with_admin("123", "2", "b@x.com");
        Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                record(1, "123", "delete", "ghost@x.com"),
                record(2, "123", "delete", "a@x.com"),
                record(3, "123", "delete", "b@x.com"),
            ]))
            .await;

        let listings = api
            .requests()
            .into_iter()
            .filter(|r| matches!(r, Request::ListAdmins(_)))
            .count();
        // ghost and a@x.com share one listing, b@x.com needs a fresh one
        assert_eq!(listings, 2);
    }

    #[tokio::test]
    async fn test_add_then_delete_sees_new_admin() {
        let api = FakeDashboard::new();
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                add(1, "123", "a@x.com", "full"),
                record(2, "123", "delete", "a@x.com"),
            ]))
            .await;

        assert_eq!(outcomes(&report), vec![(1, "submitted"), (2, "submitted")]);
        match &report.results().next().unwrap().outcome {
            Outcome::Submitted { status, admin_id, .. } => {
                assert_eq!(*status, 201);
                assert_eq!(admin_id.as_deref(), Some("1001"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            api.mutating_requests().last(),
            Some(&Request::Delete("123".into(), "1001".into()))
        );
    }

    #[tokio::test]
    async fn test_rejected_status_is_reported_not_raised() {
        let api = FakeDashboard::new().with_create_status(400);
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                add(1, "123", "a@x.com", "full"),
                add(2, "123", "b@x.com", "full"),
            ]))
            .await;

        assert_eq!(outcomes(&report), vec![(1, "submitted"), (2, "submitted")]);
        assert!(report.results().all(|r| !r.outcome.is_accepted()));
        assert!(!report.aborted);
    }

    #[tokio::test]
    async fn test_orgs_reported_in_queue_order() {
        let api = FakeDashboard::new();
        let options = DispatchOptions {
            org_concurrency: 4,
            ..DispatchOptions::default()
        };
        let report = Dispatcher::new(&api, options)
            .run(&queue(vec![
                add(1, "300", "a@x.com", "full"),
                add(2, "100", "b@x.com", "full"),
                add(3, "300", "c@x.com", "full"),
                add(4, "200", "d@x.com", "full"),
            ]))
            .await;

        let orgs: Vec<_> = report.orgs.iter().map(|o| o.org_id.as_str()).collect();
        assert_eq!(orgs, vec!["300", "100", "200"]);
        let first: Vec<_> = report.orgs[0].results.iter().map(|r| r.record.request_id).collect();
        assert_eq!(first, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_run() {
        let api = FakeDashboard::new().unreachable_org("100");
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                add(1, "100", "a@x.com", "full"),
                add(2, "100", "b@x.com", "full"),
                add(3, "200", "c@x.com", "full"),
            ]))
            .await;

        assert!(report.aborted);
        assert_eq!(outcomes(&report), vec![(1, "failed")]);
        let unattempted: Vec<_> = report.unattempted().map(|r| r.request_id).collect();
        assert_eq!(unattempted, vec![2, 3]);
        assert_eq!(report.unattempted_orgs(), vec!["200"]);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_transport_failure_isolated_when_abort_disabled() {
        let api = FakeDashboard::new().unreachable_org("100");
        let options = DispatchOptions {
            abort_on_transport_error: false,
            ..DispatchOptions::default()
        };
        let report = Dispatcher::new(&api, options)
            .run(&queue(vec![
                add(1, "100", "a@x.com", "full"),
                add(2, "200", "b@x.com", "full"),
            ]))
            .await;

        assert!(!report.aborted);
        assert_eq!(outcomes(&report), vec![(1, "failed"), (2, "submitted")]);
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_org_name_resolution() {
        let api = FakeDashboard::new().with_org("555", "Acme");
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                add(1, "Acme", "a@x.com", "full"),
                add(2, "Initech", "b@x.com", "full"),
            ]))
            .await;

        assert_eq!(report.orgs[0].resolved_id.as_deref(), Some("555"));
        assert!(matches!(api.mutating_requests()[0], Request::Create(ref org, _) if org == "555"));
        assert_eq!(
            report.orgs[1].results[0].outcome,
            Outcome::Failed { error: DispatchError::OrgNotFound("Initech".into()) }
        );
    }

    #[tokio::test]
    async fn test_deadline_leaves_records_unattempted() {
        let api = FakeDashboard::new().with_delay(Duration::from_millis(200));
        let options = DispatchOptions {
            timeout: Some(Duration::from_millis(50)),
            ..DispatchOptions::default()
        };
        let report = Dispatcher::new(&api, options)
            .run(&queue(vec![
                add(1, "100", "a@x.com", "full"),
                add(2, "100", "b@x.com", "full"),
                add(3, "200", "c@x.com", "full"),
            ]))
            .await;

        assert!(report.timed_out);
        assert!(!report.aborted);
        assert_eq!(
            report.results().next().map(|r| r.outcome.clone()),
            Some(Outcome::Failed { error: DispatchError::Api(ApiError::Timeout) })
        );
        assert_eq!(report.unattempted_count(), 2);
    }

    #[tokio::test]
    async fn test_deadline_during_org_resolution() {
        let api = FakeDashboard::new()
            .with_org("555", "Acme")
            .with_delay(Duration::from_millis(200));
        let options = DispatchOptions {
            timeout: Some(Duration::from_millis(50)),
            ..DispatchOptions::default()
        };
        let report = Dispatcher::new(&api, options)
            .run(&queue(vec![
                add(1, "Acme", "a@x.com", "full"),
                add(2, "Acme", "b@x.com", "full"),
                add(3, "Acme", "c@x.com", "full"),
            ]))
            .await;

        assert!(report.timed_out);
        assert_eq!(report.results().count(), 0);
        assert_eq!(report.unattempted_count(), 3);
        assert_eq!(report.unattempted_orgs(), vec!["Acme"]);
        assert_eq!(exit_code(&report), EXIT_INCOMPLETE);
    }

    #[tokio::test]
    async fn test_transport_failure_during_org_resolution() {
        let api = FakeDashboard::new().with_org("555", "Acme").unreachable();
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                add(1, "Acme", "a@x.com", "full"),
                add(2, "Acme", "b@x.com", "full"),
                add(3, "200", "c@x.com", "full"),
            ]))
            .await;

        assert!(report.aborted);
        assert_eq!(report.unattempted_count(), 3);
        assert_eq!(report.unattempted_orgs(), vec!["Acme", "200"]);
        assert!(api.mutating_requests().is_empty());
        assert_eq!(exit_code(&report), EXIT_INCOMPLETE);
    }

    #[tokio::test]
    async fn test_resolution_transport_failure_without_abort_fails_records() {
        let api = FakeDashboard::new().unreachable();
        let options = DispatchOptions {
            abort_on_transport_error: false,
            ..DispatchOptions::default()
        };
        let report = Dispatcher::new(&api, options)
            .run(&queue(vec![add(1, "Acme", "a@x.com", "full")]))
            .await;

        assert_eq!(outcomes(&report), vec![(1, "failed")]);
        assert!(report.is_complete());
        assert_eq!(exit_code(&report), EXIT_OK);
    }

    #[tokio::test]
    async fn test_non_json_listing_means_not_found() {
        let api = FakeDashboard::new().with_raw_listing("<html>Service Unavailable</html>");
        let report = Dispatcher::new(&api, DispatchOptions::default())
            .run(&queue(vec![
                record(1, "123", "delete", "a@x.com"),
                record(2, "123", "modify", "b@x.com"),
            ]))
            .await;

        assert_eq!(outcomes(&report), vec![(1, "skipped"), (2, "skipped")]);
        assert!(api.mutating_requests().is_empty());
    }

    #[test]
    fn test_preflight() {
        assert_eq!(preflight(&add(1, "1", "a@x.com", "full")), Ok(Operation::Add));
        assert_eq!(
            preflight(&record(1, "1", "modify", "a@x.com")),
            Ok(Operation::Modify)
        );
        assert!(matches!(
            preflight(&add(1, "1", "a@x.com", "none")),
            Err(DispatchError::Validation(ValidationError::NullPermission))
        ));
        assert!(matches!(
            preflight(&record(1, "1", "purge", "a@x.com")),
            Err(DispatchError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_created_id() {
        assert_eq!(created_id(r#"{"id":"77"}"#), Some("77".to_string()));
        assert_eq!(created_id(r#"{"id":77}"#), Some("77".to_string()));
        assert_eq!(created_id(""), None);
    }
}
