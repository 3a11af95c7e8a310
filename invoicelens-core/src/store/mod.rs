//! Storage abstraction for the ingestion pipeline.
//!
//! The normalizer never touches a database handle directly; it hands each
//! record's rows to an [`IngestStore`]. The Postgres implementation backs the
//! real pipeline, the in-memory one backs the test suite and dry runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::ingest::normalize::RecordRows;

/// Store-level failures, surfaced to the runner's per-record boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Aggregate statistics over the invoice table, reported after a run.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceStats {
    pub invoice_count: i64,
    pub total_spend: Decimal,
    pub average_total: Decimal,
}

/// Destination for normalized rows.
///
/// `persist_record` must be atomic per record: the vendor/customer upserts
/// and the invoice, line-item, and payment inserts either all land or none
/// do. Dimension upserts are first-seen-wins (an existing key is left
/// unmodified). The pipeline is strictly sequential, so implementations only
/// need the store's own primary-key atomicity, not extra locking.
#[allow(async_fn_in_trait)]
pub trait IngestStore {
    /// Atomically writes all rows derived from one source record.
    async fn persist_record(&self, rows: &RecordRows) -> Result<(), StoreError>;

    /// Count, sum, and average of invoice totals (zero-safe when empty).
    async fn invoice_stats(&self) -> Result<InvoiceStats, StoreError>;
}
