use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Vendor dimension entity.
///
/// This struct maps to the `vendors` table. The primary key is a natural
/// identity key: the vendor's tax id when the extraction produced one,
/// otherwise `vendor-<slug(name)>`. The key is stable across ingestion runs
/// so repeated seeds of the same source data never create duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    /// Identity key (tax id or name slug, see module docs)
    pub id: String,

    /// Display name ("Unknown Vendor" when the extraction has none)
    pub name: String,

    /// Tax identifier, when extracted
    pub tax_id: Option<String>,

    /// Address blob as `{"raw": <text>}`, when extracted
    pub address: Option<Value>,

    /// Timestamp when the vendor was first seen
    pub created_at: DateTime<Utc>,
}
