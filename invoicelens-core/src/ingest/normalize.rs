//! Mapping from raw extraction records to normalized relational rows.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ingest::raw::{RawRecord, ScoredExt};
use crate::ingest::IngestError;
use crate::models::{Customer, Invoice, InvoiceStatus, LineItem, Payment, Vendor};

/// Every row derived from a single source record.
///
/// Produced by [`map_record`] as a pure value and persisted atomically by the
/// store, so a failed record never leaves a half-written invoice behind.
#[derive(Debug, Clone)]
pub struct RecordRows {
    pub vendor: Vendor,
    pub customer: Customer,
    pub invoice: Invoice,
    pub line_items: Vec<LineItem>,
    pub payment: Option<Payment>,
}

/// Lower-cases a name and collapses runs of whitespace into single hyphens.
///
/// Used as the fallback identity key for vendors and customers, so the result
/// must be stable across runs for the same input name.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Derives the business status of an invoice.
///
/// Records the upstream pipeline has not finished are always pending. For
/// processed records the due date decides: strictly before `today` means
/// overdue, anything else (due today, later, or no due date at all) counts as
/// paid. The no-due-date-means-paid branch mirrors the upstream data model
/// and is flagged as a possible artifact of missing data.
pub fn derive_status(
    source_status: Option<&str>,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> InvoiceStatus {
    if source_status != Some("processed") {
        return InvoiceStatus::Pending;
    }
    match due_date {
        Some(due) if due < today => InvoiceStatus::Overdue,
        _ => InvoiceStatus::Paid,
    }
}

/// Maps one raw record to its normalized rows.
///
/// Missing leaves are tolerated via the defaults described in the entity
/// docs; only genuinely broken data (unparseable dates, a record with neither
/// an invoice date nor a creation timestamp) is an error. A record without
/// the nested extraction payload returns [`IngestError::MissingExtraction`],
/// which the runner counts as a skip rather than a failure.
///
/// `raw_json` is the record as it appeared in the export and is retained
/// verbatim on the invoice for audit. `today` anchors status derivation.
pub fn map_record(
    record: &RawRecord,
    raw_json: &Value,
    today: NaiveDate,
) -> Result<RecordRows, IngestError> {
    let llm = record
        .extracted_data
        .as_ref()
        .and_then(|data| data.llm_data.as_ref())
        .ok_or(IngestError::MissingExtraction)?;

    let now = Utc::now();

    // Vendor: keyed by tax id when present, else by name slug. First-seen-wins
    // upserts downstream mean these attributes only matter for the first
    // record that introduces the key.
    let vendor_fields = llm.vendor.as_ref().and_then(|v| v.value.as_ref());
    let vendor_name = vendor_fields
        .and_then(|v| v.vendor_name.leaf())
        .cloned()
        .unwrap_or_else(|| "Unknown Vendor".to_string());
    let vendor_tax_id = vendor_fields
        .and_then(|v| v.vendor_tax_id.leaf())
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());
    let vendor_id = vendor_tax_id
        .clone()
        .unwrap_or_else(|| format!("vendor-{}", slugify(&vendor_name)));
    let vendor = Vendor {
        id: vendor_id.clone(),
        name: vendor_name,
        tax_id: vendor_tax_id,
        address: vendor_fields
            .and_then(|v| v.vendor_address.leaf())
            .map(|addr| json!({ "raw": addr })),
        created_at: now,
    };

    // Customer: no external id exists, the slug key is the only identity.
    let customer_fields = llm.customer.as_ref().and_then(|c| c.value.as_ref());
    let customer_name = customer_fields
        .and_then(|c| c.customer_name.leaf())
        .cloned()
        .unwrap_or_else(|| "Unknown Customer".to_string());
    let customer_id = format!("customer-{}", slugify(&customer_name));
    let customer = Customer {
        id: customer_id.clone(),
        name: customer_name,
        email: customer_fields.and_then(|c| c.customer_email.leaf()).cloned(),
        address: customer_fields
            .and_then(|c| c.customer_address.leaf())
            .map(|addr| json!({ "raw": addr })),
        created_at: now,
    };

    let invoice_fields = llm.invoice.as_ref().and_then(|i| i.value.as_ref());
    let payment_fields = llm.payment.as_ref().and_then(|p| p.value.as_ref());
    let summary_fields = llm.summary.as_ref().and_then(|s| s.value.as_ref());

    let invoice_number = invoice_fields
        .and_then(|i| i.invoice_id.leaf())
        .cloned()
        .unwrap_or_else(|| record.id.clone());

    let issue_date = match invoice_fields.and_then(|i| i.invoice_date.leaf()) {
        Some(raw) => parse_date(raw)?,
        None => record
            .created_at
            .as_ref()
            .map(|ts| ts.date.date_naive())
            .ok_or(IngestError::MissingIssueDate)?,
    };
    let due_date = payment_fields
        .and_then(|p| p.due_date.leaf())
        .map(|raw| parse_date(raw))
        .transpose()?;

    // Money: the extraction occasionally reports credit notes as negative
    // amounts; the analytics schema stores magnitudes only. Tax is the one
    // field where absence is preserved instead of coerced to zero.
    let subtotal = summary_fields
        .and_then(|s| s.sub_total.leaf())
        .copied()
        .unwrap_or(Decimal::ZERO)
        .abs();
    let tax = summary_fields
        .and_then(|s| s.total_tax.leaf())
        .map(|tax| tax.abs());
    let total = summary_fields
        .and_then(|s| s.invoice_total.leaf())
        .copied()
        .unwrap_or(Decimal::ZERO)
        .abs();
    let currency = summary_fields
        .and_then(|s| s.currency_symbol.leaf())
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
        .unwrap_or("EUR")
        .to_string();

    let status = derive_status(record.status.as_deref(), due_date, today);

    let invoice_id = Uuid::new_v4();
    let invoice = Invoice {
        id: invoice_id,
        invoice_number,
        vendor_id,
        customer_id,
        issue_date,
        due_date,
        status,
        subtotal,
        tax,
        total,
        currency,
        description: record.name.clone(),
        raw_json: raw_json.clone(),
        created_at: now,
    };

    let line_items = build_line_items(record, llm, invoice_id, subtotal);
    let payment = build_payment(record, payment_fields, invoice_id, status, total, issue_date);

    Ok(RecordRows {
        vendor,
        customer,
        invoice,
        line_items,
        payment,
    })
}

/// Builds the invoice's line items, synthesizing one from the subtotal when
/// the extraction has no usable list. Every invoice ends up with >= 1 item.
fn build_line_items(
    record: &RawRecord,
    llm: &crate::ingest::raw::LlmData,
    invoice_id: Uuid,
    subtotal: Decimal,
) -> Vec<LineItem> {
    let extracted = llm
        .line_items
        .as_ref()
        .and_then(|items| items.value.as_ref())
        .filter(|items| !items.is_empty());

    match extracted {
        Some(items) => items
            .iter()
            .map(|item| {
                let quantity = item.quantity.leaf().copied().unwrap_or(Decimal::ONE);
                let unit_price = item.unit_price.leaf().copied().unwrap_or(Decimal::ZERO);
                let total = item
                    .total
                    .leaf()
                    .copied()
                    .unwrap_or_else(|| unit_price * quantity);
                LineItem {
                    id: Uuid::new_v4(),
                    invoice_id,
                    description: item
                        .description
                        .leaf()
                        .cloned()
                        .unwrap_or_else(|| "Unknown Item".to_string()),
                    quantity,
                    unit_price: unit_price.abs(),
                    total: total.abs(),
                    category: item
                        .category
                        .leaf()
                        .cloned()
                        .unwrap_or_else(|| "General".to_string()),
                }
            })
            .collect(),
        None => vec![LineItem {
            id: Uuid::new_v4(),
            invoice_id,
            description: record
                .name
                .clone()
                .unwrap_or_else(|| "Invoice Item".to_string()),
            quantity: Decimal::ONE,
            unit_price: subtotal,
            total: subtotal,
            category: "General".to_string(),
        }],
    }
}

/// Builds the payment row for invoices that came out of status derivation as
/// paid with a positive normalized total; all other invoices get none.
fn build_payment(
    record: &RawRecord,
    payment_fields: Option<&crate::ingest::raw::PaymentFields>,
    invoice_id: Uuid,
    status: InvoiceStatus,
    total: Decimal,
    issue_date: NaiveDate,
) -> Option<Payment> {
    if status != InvoiceStatus::Paid || total <= Decimal::ZERO {
        return None;
    }

    let paid_at = record
        .updated_at
        .as_ref()
        .or(record.created_at.as_ref())
        .map(|ts| ts.date)
        .unwrap_or_else(|| paid_at_fallback(issue_date));

    Some(Payment {
        id: Uuid::new_v4(),
        invoice_id,
        amount: total,
        paid_at,
        method: "bank_transfer".to_string(),
        transaction_id: payment_fields
            .and_then(|p| p.bank_account_number.leaf())
            .cloned(),
    })
}

fn paid_at_fallback(issue_date: NaiveDate) -> DateTime<Utc> {
    issue_date.and_time(NaiveTime::MIN).and_utc()
}

/// Parses a date leaf. The extraction emits a mix of ISO timestamps and
/// plain or European-formatted dates.
fn parse_date(value: &str) -> Result<NaiveDate, IngestError> {
    let trimmed = value.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }
    for format in ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(IngestError::UnparseableDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
    }

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Acme GmbH"), "acme-gmbh");
        assert_eq!(slugify("  Deutsche   Bahn  AG "), "deutsche-bahn-ag");
        assert_eq!(slugify("single"), "single");
    }

    #[test]
    fn unprocessed_records_are_pending() {
        let today = date("2024-06-01");
        assert_eq!(
            derive_status(Some("uploaded"), Some(date("2020-01-01")), today),
            InvoiceStatus::Pending
        );
        assert_eq!(derive_status(None, None, today), InvoiceStatus::Pending);
    }

    #[test]
    fn processed_past_due_is_overdue() {
        let today = date("2024-06-01");
        assert_eq!(
            derive_status(Some("processed"), Some(date("2024-05-31")), today),
            InvoiceStatus::Overdue
        );
    }

    #[test]
    fn processed_due_today_or_later_is_paid() {
        let today = date("2024-06-01");
        assert_eq!(
            derive_status(Some("processed"), Some(date("2024-06-01")), today),
            InvoiceStatus::Paid
        );
        assert_eq!(
            derive_status(Some("processed"), Some(date("2024-07-15")), today),
            InvoiceStatus::Paid
        );
    }

    #[test]
    fn processed_without_due_date_is_paid() {
        let today = date("2024-06-01");
        assert_eq!(
            derive_status(Some("processed"), None, today),
            InvoiceStatus::Paid
        );
    }

    #[test]
    fn parse_date_accepts_common_formats() {
        assert_eq!(parse_date("2024-03-15").unwrap(), date("2024-03-15"));
        assert_eq!(parse_date("15.03.2024").unwrap(), date("2024-03-15"));
        assert_eq!(parse_date("15/03/2024").unwrap(), date("2024-03-15"));
        assert_eq!(
            parse_date("2024-03-15T08:00:00Z").unwrap(),
            date("2024-03-15")
        );
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("not a date"),
            Err(IngestError::UnparseableDate(_))
        ));
    }
}
