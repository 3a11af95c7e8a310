use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment record for a paid invoice.
///
/// Maps to the `payments` table. Created only when the derived invoice
/// status is paid and the normalized total is positive, so an invoice has
/// either zero or one payment from this pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Unique identifier for the payment
    pub id: Uuid,

    /// Owning invoice (foreign key, cascade delete)
    pub invoice_id: Uuid,

    /// Amount paid (= the invoice total, non-negative)
    pub amount: Decimal,

    /// When the payment was made (the source record's update timestamp)
    pub paid_at: DateTime<Utc>,

    /// Payment method; this pipeline always records "bank_transfer"
    pub method: String,

    /// External transaction reference (extracted bank account number), if any
    pub transaction_id: Option<String>,
}
