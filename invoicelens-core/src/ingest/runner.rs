//! The sequential ingestion loop with per-record error isolation.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::ingest::normalize::map_record;
use crate::ingest::raw::RawRecord;
use crate::ingest::IngestError;
use crate::store::{IngestStore, InvoiceStats};

/// Why a record was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The record has no nested extraction payload at all.
    NoPayload,

    /// Something went wrong while resolving or writing the record.
    ProcessingError(String),
}

/// Outcome of a single record, folded into the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Processed,
    Skipped(SkipReason),
}

/// What a completed run reports to the operator.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Records that produced a full set of rows
    pub processed: usize,

    /// Records skipped for either missing payloads or processing errors
    pub skipped: usize,

    /// Aggregate statistics over the invoice table after the run
    pub stats: InvoiceStats,
}

/// Runs the normalizer over an ordered sequence of raw records.
///
/// Records are processed strictly one at a time, in input order; each
/// record's writes are a single atomic unit at the store, so a failure leaves
/// nothing behind for that record and the run simply moves on. Only a failure
/// to read post-run statistics aborts with an error.
///
/// `today` anchors due-date comparison for status derivation; the seed binary
/// passes the current UTC date.
///
/// # Arguments
///
/// * `store` - Destination for normalized rows
/// * `records` - The raw export, one JSON value per record
/// * `today` - Reference date for overdue detection
///
/// # Returns
///
/// Returns a [`RunSummary`] with processed/skipped counts and invoice
/// aggregates, or an error if the summary statistics cannot be read.
pub async fn run_ingest<S: IngestStore>(
    store: &S,
    records: &[Value],
    today: NaiveDate,
) -> Result<RunSummary, IngestError> {
    info!("Found {} records to process", records.len());

    let mut processed = 0usize;
    let mut skipped = 0usize;

    for record in records {
        match ingest_one(store, record, today).await {
            RecordOutcome::Processed => {
                processed += 1;
                if processed % 10 == 0 {
                    info!("Processed {} invoices...", processed);
                }
            }
            RecordOutcome::Skipped(_) => {
                skipped += 1;
            }
        }
    }

    let stats = store.invoice_stats().await?;

    info!(
        "Ingest run completed: {} processed, {} skipped",
        processed, skipped
    );

    Ok(RunSummary {
        processed,
        skipped,
        stats,
    })
}

/// Processes a single record, never letting its failures escape.
///
/// Decoding happens per record so one malformed entry in the export cannot
/// abort the run. All skip paths log with the record's identifier.
async fn ingest_one<S: IngestStore>(
    store: &S,
    raw_json: &Value,
    today: NaiveDate,
) -> RecordOutcome {
    let record_id = raw_json
        .get("_id")
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string();

    let record: RawRecord = match serde_json::from_value(raw_json.clone()) {
        Ok(record) => record,
        Err(e) => {
            error!("Malformed record {}: {}", record_id, e);
            return RecordOutcome::Skipped(SkipReason::ProcessingError(e.to_string()));
        }
    };

    let rows = match map_record(&record, raw_json, today) {
        Ok(rows) => rows,
        Err(IngestError::MissingExtraction) => {
            debug!("Record {} has no extraction payload, skipping", record.id);
            return RecordOutcome::Skipped(SkipReason::NoPayload);
        }
        Err(e) => {
            error!("Error processing record {}: {}", record.id, e);
            return RecordOutcome::Skipped(SkipReason::ProcessingError(e.to_string()));
        }
    };

    if let Err(e) = store.persist_record(&rows).await {
        error!("Error persisting record {}: {}", record.id, e);
        return RecordOutcome::Skipped(SkipReason::ProcessingError(e.to_string()));
    }

    RecordOutcome::Processed
}
