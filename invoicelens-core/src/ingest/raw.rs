//! Typed view of the raw extraction export.
//!
//! The upstream document-extraction process emits confidence-scored output:
//! every leaf is wrapped in a `{"value": ...}` envelope and any leaf, envelope
//! or sub-object may be missing entirely. The types here mirror that shape
//! with `Option` at every level, and [`ScoredExt`] gives a single safe way to
//! reach through the envelope instead of repeating the unwrapping per field.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// A confidence-scored leaf: `{"value": T, ...}`.
///
/// The envelope may be present with a null or missing `value` (serde treats
/// a missing key for an `Option` field as `None`); extra fields (confidence
/// scores, bounding boxes) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Scored<T> {
    pub value: Option<T>,
}

/// Accessor for optionally-enveloped leaves.
pub trait ScoredExt<T> {
    /// The leaf value, if both the envelope and its `value` are present.
    fn leaf(&self) -> Option<&T>;
}

impl<T> ScoredExt<T> for Option<Scored<T>> {
    fn leaf(&self) -> Option<&T> {
        self.as_ref().and_then(|scored| scored.value.as_ref())
    }
}

/// A Mongo-export timestamp: `{"$date": "<RFC3339>"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BsonDate {
    #[serde(rename = "$date")]
    pub date: DateTime<Utc>,
}

/// One raw record of the extraction export.
///
/// Only `_id` is required; everything else is tolerated as absent. Records
/// whose nested payload is missing are skippable, not errors.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(rename = "_id")]
    pub id: String,

    /// Display name of the source document
    #[serde(default)]
    pub name: Option<String>,

    /// Upstream lifecycle status ("processed" once extraction finished)
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub created_at: Option<BsonDate>,

    #[serde(default)]
    pub updated_at: Option<BsonDate>,

    #[serde(default)]
    pub extracted_data: Option<ExtractedData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    #[serde(default)]
    pub llm_data: Option<LlmData>,
}

/// The nested extraction payload. Each sub-object is itself enveloped.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmData {
    #[serde(default)]
    pub invoice: Option<Scored<InvoiceFields>>,

    #[serde(default)]
    pub vendor: Option<Scored<VendorFields>>,

    #[serde(default)]
    pub customer: Option<Scored<CustomerFields>>,

    #[serde(default)]
    pub payment: Option<Scored<PaymentFields>>,

    #[serde(default)]
    pub summary: Option<Scored<SummaryFields>>,

    #[serde(default)]
    pub line_items: Option<Scored<Vec<LineItemFields>>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFields {
    #[serde(default)]
    pub invoice_id: Option<Scored<String>>,

    #[serde(default)]
    pub invoice_date: Option<Scored<String>>,

    #[serde(default)]
    pub delivery_date: Option<Scored<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorFields {
    #[serde(default)]
    pub vendor_name: Option<Scored<String>>,

    #[serde(default)]
    pub vendor_party_number: Option<Scored<String>>,

    #[serde(default)]
    pub vendor_address: Option<Scored<String>>,

    #[serde(default)]
    pub vendor_tax_id: Option<Scored<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFields {
    #[serde(default)]
    pub customer_name: Option<Scored<String>>,

    #[serde(default)]
    pub customer_address: Option<Scored<String>>,

    #[serde(default)]
    pub customer_email: Option<Scored<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFields {
    #[serde(default)]
    pub due_date: Option<Scored<String>>,

    #[serde(default)]
    pub payment_terms: Option<Scored<String>>,

    #[serde(default)]
    pub bank_account_number: Option<Scored<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFields {
    #[serde(default)]
    pub sub_total: Option<Scored<Decimal>>,

    #[serde(default)]
    pub total_tax: Option<Scored<Decimal>>,

    #[serde(default)]
    pub invoice_total: Option<Scored<Decimal>>,

    #[serde(default)]
    pub currency_symbol: Option<Scored<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemFields {
    #[serde(default)]
    pub description: Option<Scored<String>>,

    #[serde(default)]
    pub quantity: Option<Scored<Decimal>>,

    #[serde(default)]
    pub unit_price: Option<Scored<Decimal>>,

    #[serde(default)]
    pub total: Option<Scored<Decimal>>,

    #[serde(default)]
    pub category: Option<Scored<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leaf_reaches_through_envelope() {
        let fields: VendorFields = serde_json::from_value(json!({
            "vendorName": { "value": "Acme GmbH", "confidence": 0.97 },
        }))
        .expect("valid vendor fields");

        assert_eq!(fields.vendor_name.leaf().map(String::as_str), Some("Acme GmbH"));
        assert_eq!(fields.vendor_tax_id.leaf(), None);
    }

    #[test]
    fn leaf_tolerates_null_and_missing_value() {
        let fields: VendorFields = serde_json::from_value(json!({
            "vendorName": { "value": null },
            "vendorTaxId": {},
        }))
        .expect("valid vendor fields");

        assert_eq!(fields.vendor_name.leaf(), None);
        assert_eq!(fields.vendor_tax_id.leaf(), None);
    }

    #[test]
    fn payload_with_absent_sub_objects_deserializes() {
        let llm: LlmData = serde_json::from_value(json!({
            "vendor": { "value": { "vendorName": { "value": "Acme GmbH" } } },
        }))
        .expect("partial payload");

        assert!(llm.vendor.is_some());
        assert!(llm.invoice.is_none());
        assert!(llm.summary.is_none());
        assert!(llm.line_items.is_none());
    }

    #[test]
    fn record_with_only_id_deserializes() {
        let record: RawRecord =
            serde_json::from_value(json!({ "_id": "rec-1" })).expect("minimal record");

        assert_eq!(record.id, "rec-1");
        assert!(record.extracted_data.is_none());
        assert!(record.created_at.is_none());
    }

    #[test]
    fn bson_date_parses_rfc3339() {
        let record: RawRecord = serde_json::from_value(json!({
            "_id": "rec-2",
            "createdAt": { "$date": "2024-03-01T10:30:00Z" },
        }))
        .expect("record with timestamp");

        let created = record.created_at.expect("created_at present");
        assert_eq!(created.date.date_naive().to_string(), "2024-03-01");
    }
}
