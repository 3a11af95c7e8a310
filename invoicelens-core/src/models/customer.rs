use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Customer dimension entity.
///
/// Maps to the `customers` table. Unlike vendors there is no external
/// identifier in the extraction, so the key is always `customer-<slug(name)>`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    /// Identity key (`customer-<slug(name)>`)
    pub id: String,

    /// Display name ("Unknown Customer" when the extraction has none)
    pub name: String,

    /// Email address, when extracted
    pub email: Option<String>,

    /// Address blob as `{"raw": <text>}`, when extracted
    pub address: Option<Value>,

    /// Timestamp when the customer was first seen
    pub created_at: DateTime<Utc>,
}
