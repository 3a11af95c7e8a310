use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Invoice status derived at ingestion time.
///
/// The upstream extraction only carries a lifecycle status on the source
/// record ("processed" or not); the business status stored here is derived:
/// - not yet processed upstream -> Pending
/// - processed with a due date in the past -> Overdue
/// - processed otherwise (due today, in the future, or absent) -> Paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum InvoiceStatus {
    #[sqlx(rename = "pending")]
    Pending,

    #[sqlx(rename = "overdue")]
    Overdue,

    #[sqlx(rename = "paid")]
    Paid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::Overdue => write!(f, "overdue"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Invoice fact entity.
///
/// Maps to the `invoices` table. One row per successfully ingested source
/// record. Rows are created once by the pipeline and never updated afterwards;
/// the original source record is retained verbatim in `raw_json` for audit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    /// Unique identifier for the invoice
    pub id: Uuid,

    /// Invoice number from the extraction, falling back to the source
    /// record's own id
    pub invoice_number: String,

    /// Owning vendor (foreign key into `vendors`)
    pub vendor_id: String,

    /// Owning customer (foreign key into `customers`)
    pub customer_id: String,

    /// Issue date (extracted invoice date, else the record's creation date)
    pub issue_date: NaiveDate,

    /// Due date, when extracted
    pub due_date: Option<NaiveDate>,

    /// Derived business status
    pub status: InvoiceStatus,

    /// Subtotal, sign-normalized to be non-negative
    pub subtotal: Decimal,

    /// Tax amount; absent stays absent rather than becoming zero
    pub tax: Option<Decimal>,

    /// Total, sign-normalized to be non-negative
    pub total: Decimal,

    /// ISO 4217 currency code, defaulting to "EUR"
    pub currency: String,

    /// Free-text description (the source record's display name)
    pub description: Option<String>,

    /// The raw source record, retained verbatim for audit/debugging
    pub raw_json: Value,

    /// Timestamp when the invoice row was created
    pub created_at: DateTime<Utc>,
}
