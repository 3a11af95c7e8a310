//! The ingestion normalizer: raw extraction records in, relational rows out.

pub mod normalize;
pub mod raw;
pub mod runner;


pub use normalize::{derive_status, map_record, slugify, RecordRows};
pub use raw::{RawRecord, Scored, ScoredExt};
pub use runner::{run_ingest, RecordOutcome, RunSummary, SkipReason};

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while normalizing a single record.
///
/// `MissingExtraction` marks a skippable record (the export contains entries
/// that never went through extraction); everything else is a processing error
/// caught at the per-record boundary by the runner.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("record has no extraction payload")]
    MissingExtraction,

    #[error("unparseable date value: {0:?}")]
    UnparseableDate(String),

    #[error("record has neither an invoice date nor a creation timestamp")]
    MissingIssueDate,

    #[error(transparent)]
    Store(#[from] StoreError),
}
