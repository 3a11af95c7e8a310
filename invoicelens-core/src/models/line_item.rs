use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice line item.
///
/// Maps to the `line_items` table; rows are owned by their invoice and
/// deleted with it (cascade). Every invoice has at least one line item: when
/// the extraction has no usable line-item list, a single synthetic item is
/// created from the invoice subtotal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    /// Unique identifier for the line item
    pub id: Uuid,

    /// Owning invoice (foreign key, cascade delete)
    pub invoice_id: Uuid,

    /// Item description (default "Unknown Item")
    pub description: String,

    /// Quantity (default 1)
    pub quantity: Decimal,

    /// Unit price, sign-normalized to be non-negative
    pub unit_price: Decimal,

    /// Line total, defaulting to unit price x quantity, non-negative
    pub total: Decimal,

    /// Spend category (default "General")
    pub category: String,
}
