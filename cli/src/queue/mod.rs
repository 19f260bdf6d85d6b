//! Queue construction.
//!
//! Rows are normalized and grouped into an [`OrgQueue`](crate::models::OrgQueue),
//! merging continuation rows into the record they extend.

pub mod builder;

pub use builder::{build_queue, build_queue_from_reader, QueueBuilder};
