//! In-memory store used by the test suite and by `INGEST_DRY_RUN=1`.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::ingest::normalize::RecordRows;
use crate::models::{Customer, Invoice, LineItem, Payment, Vendor};
use crate::store::{IngestStore, InvoiceStats, StoreError};

#[derive(Debug, Default)]
struct Tables {
    vendors: HashMap<String, Vendor>,
    customers: HashMap<String, Customer>,
    invoices: Vec<Invoice>,
    line_items: Vec<LineItem>,
    payments: Vec<Payment>,
}

/// HashMap/Vec-backed store with the same semantics as [`super::PgStore`]:
/// first-seen-wins upserts for the dimension tables and all-or-nothing writes
/// per record (trivially so, since nothing here can fail).
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store mutex poisoned")
    }

    pub fn vendors(&self) -> Vec<Vendor> {
        self.lock().vendors.values().cloned().collect()
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.lock().customers.values().cloned().collect()
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.lock().invoices.clone()
    }

    pub fn line_items(&self) -> Vec<LineItem> {
        self.lock().line_items.clone()
    }

    pub fn line_items_for(&self, invoice_id: Uuid) -> Vec<LineItem> {
        self.lock()
            .line_items
            .iter()
            .filter(|item| item.invoice_id == invoice_id)
            .cloned()
            .collect()
    }

    pub fn payments(&self) -> Vec<Payment> {
        self.lock().payments.clone()
    }
}

impl IngestStore for MemoryStore {
    async fn persist_record(&self, rows: &RecordRows) -> Result<(), StoreError> {
        let mut tables = self.lock();

        tables
            .vendors
            .entry(rows.vendor.id.clone())
            .or_insert_with(|| rows.vendor.clone());
        tables
            .customers
            .entry(rows.customer.id.clone())
            .or_insert_with(|| rows.customer.clone());

        tables.invoices.push(rows.invoice.clone());
        tables.line_items.extend(rows.line_items.iter().cloned());
        if let Some(payment) = &rows.payment {
            tables.payments.push(payment.clone());
        }

        Ok(())
    }

    async fn invoice_stats(&self) -> Result<InvoiceStats, StoreError> {
        let tables = self.lock();
        let invoice_count = tables.invoices.len() as i64;
        let total_spend: Decimal = tables.invoices.iter().map(|invoice| invoice.total).sum();
        let average_total = if invoice_count > 0 {
            total_spend / Decimal::from(invoice_count)
        } else {
            Decimal::ZERO
        };

        Ok(InvoiceStats {
            invoice_count,
            total_spend,
            average_total,
        })
    }
}
