//! Group normalized rows into per-organization admin records.
//!
//! ```text
//! CSV rows                                  OrgQueue
//! ┌───────────────────────────────────┐     ┌──────────────────────────────┐
//! │ 1  add  ann@x  org 123  tag:lab   │     │ org 123                      │
//! │    (blank)     net N_1            │  →  │   #1 ann@x tags=[lab]        │
//! │    (blank)     net N_2            │     │         networks=[N_1, N_2]  │
//! │ 4  delete bob@x org 456           │     │ org 456                      │
//! └───────────────────────────────────┘     │   #4 bob@x                   │
//!                                           └──────────────────────────────┘
//! ```
//!
//! Continuation rows (blank orgid and operation) extend the record produced
//! by the closest preceding operation row. The builder tracks that record by
//! its slot in the queue rather than by reference.

use std::io::Read;

use crate::error::{FormatError, IngestError, IngestResult};
use crate::models::{AdminRecord, GrantKind, OrgQueue};
use crate::parser::{NormalizedRow, RawRow, RowNormalizer, RowReader};

/// Position of a record inside the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordSlot {
    org: usize,
    record: usize,
}

/// Incremental queue construction.
#[derive(Debug)]
pub struct QueueBuilder {
    normalizer: RowNormalizer,
    queue: OrgQueue,
    last: Option<RecordSlot>,
}

impl QueueBuilder {
    /// Validate the header row and prepare an empty queue.
    pub fn new(headers: &[String]) -> IngestResult<Self> {
        let normalizer = RowNormalizer::new(headers)?;
        if !normalizer.has_field("orgid") {
            return Err(IngestError::MissingMandatoryHeader);
        }

        Ok(Self {
            normalizer,
            queue: OrgQueue::new(),
            last: None,
        })
    }

    /// Feed the next row, in file order.
    pub fn push_row(&mut self, raw: &RawRow) -> IngestResult<()> {
        let row = self.normalizer.normalize(raw)?;

        if row.is_continuation() {
            self.merge_continuation(&row)?;
        } else {
            self.start_record(&row)?;
        }
        Ok(())
    }

    /// Finish and hand over the queue.
    pub fn finish(self) -> OrgQueue {
        self.queue
    }

    fn start_record(&mut self, row: &NormalizedRow) -> IngestResult<()> {
        let org_id = row
            .field_owned("orgid")
            .ok_or(FormatError::EmptyOrgId { line: row.line })?;

        let mut record = AdminRecord::new(row.ordinal, row.line, org_id);
        record.operation = row.field_owned("operation").unwrap_or_default();
        record.name = row.field_owned("name");
        record.email = row.field_owned("email");
        record.org_access = row.field_owned("orgaccess");
        append_grants(&mut record, row);

        let (org, idx) = self.queue.push(record);
        self.last = Some(RecordSlot { org, record: idx });
        Ok(())
    }

    fn merge_continuation(&mut self, row: &NormalizedRow) -> IngestResult<()> {
        if let Some(field) = row.first_identity_field() {
            return Err(FormatError::ContinuationWithIdentity {
                line: row.line,
                field: field.to_string(),
            }
            .into());
        }

        let target = self
            .last
            .and_then(|slot| self.queue.record_mut(slot.org, slot.record))
            .ok_or(FormatError::OrphanContinuation { line: row.line })?;

        append_grants(target, row);
        Ok(())
    }
}

fn append_grants(record: &mut AdminRecord, row: &NormalizedRow) {
    for kind in [GrantKind::Network, GrantKind::Tag] {
        if let Some(grant) = row.grant(kind) {
            record.grants_mut(kind).push(grant.clone());
        }
    }
}

/// Build a queue from a header row and a sequence of rows.
///
/// The first error aborts the build; no partial queue is returned.
pub fn build_queue<I>(headers: &[String], rows: I) -> IngestResult<OrgQueue>
where
    I: IntoIterator<Item = IngestResult<RawRow>>,
{
    let mut builder = QueueBuilder::new(headers)?;
    for row in rows {
        builder.push_row(&row?)?;
    }
    Ok(builder.finish())
}

/// Build a queue straight from a [`RowReader`].
pub fn build_queue_from_reader<R: Read>(reader: RowReader<R>) -> IngestResult<OrgQueue> {
    let headers = reader.headers().to_vec();
    build_queue(&headers, reader)
}
