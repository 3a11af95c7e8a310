//! Postgres-backed store.
//!
//! Each record's writes run in a single transaction; dimension upserts use
//! `ON CONFLICT DO NOTHING` so the first record that introduces a vendor or
//! customer key determines its stored attributes.

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::ingest::normalize::RecordRows;
use crate::store::{IngestStore, InvoiceStats, StoreError};

/// DDL for the five ingestion tables. Plain `CREATE TABLE IF NOT EXISTS`
/// rather than a migration framework; line items and payments cascade with
/// their invoice.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS vendors (
        id VARCHAR PRIMARY KEY,
        name VARCHAR NOT NULL,
        tax_id VARCHAR,
        address JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id VARCHAR PRIMARY KEY,
        name VARCHAR NOT NULL,
        email VARCHAR,
        address JSONB,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id UUID PRIMARY KEY,
        invoice_number VARCHAR NOT NULL,
        vendor_id VARCHAR NOT NULL REFERENCES vendors(id),
        customer_id VARCHAR NOT NULL REFERENCES customers(id),
        issue_date DATE NOT NULL,
        due_date DATE,
        status VARCHAR NOT NULL,
        subtotal NUMERIC NOT NULL,
        tax NUMERIC,
        total NUMERIC NOT NULL,
        currency VARCHAR NOT NULL,
        description TEXT,
        raw_json JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS line_items (
        id UUID PRIMARY KEY,
        invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
        description VARCHAR NOT NULL,
        quantity NUMERIC NOT NULL,
        unit_price NUMERIC NOT NULL,
        total NUMERIC NOT NULL,
        category VARCHAR NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id UUID PRIMARY KEY,
        invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
        amount NUMERIC NOT NULL,
        paid_at TIMESTAMPTZ NOT NULL,
        method VARCHAR NOT NULL,
        transaction_id VARCHAR
    )
    "#,
];

/// Store implementation over a `sqlx` Postgres pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database and wraps the pool in a store.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Closes the underlying pool; called before surfacing fatal errors so
    /// no connection outlives the run.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Creates the ingestion tables if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

impl IngestStore for PgStore {
    async fn persist_record(&self, rows: &RecordRows) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO vendors (id, name, tax_id, address, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&rows.vendor.id)
        .bind(&rows.vendor.name)
        .bind(&rows.vendor.tax_id)
        .bind(&rows.vendor.address)
        .bind(rows.vendor.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, address, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&rows.customer.id)
        .bind(&rows.customer.name)
        .bind(&rows.customer.email)
        .bind(&rows.customer.address)
        .bind(rows.customer.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, vendor_id, customer_id, issue_date, due_date,
                status, subtotal, tax, total, currency, description, raw_json, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(rows.invoice.id)
        .bind(&rows.invoice.invoice_number)
        .bind(&rows.invoice.vendor_id)
        .bind(&rows.invoice.customer_id)
        .bind(rows.invoice.issue_date)
        .bind(rows.invoice.due_date)
        .bind(rows.invoice.status)
        .bind(rows.invoice.subtotal)
        .bind(rows.invoice.tax)
        .bind(rows.invoice.total)
        .bind(&rows.invoice.currency)
        .bind(&rows.invoice.description)
        .bind(&rows.invoice.raw_json)
        .bind(rows.invoice.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &rows.line_items {
            sqlx::query(
                r#"
                INSERT INTO line_items (id, invoice_id, description, quantity, unit_price, total, category)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id)
            .bind(item.invoice_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total)
            .bind(&item.category)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(payment) = &rows.payment {
            sqlx::query(
                r#"
                INSERT INTO payments (id, invoice_id, amount, paid_at, method, transaction_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(payment.id)
            .bind(payment.invoice_id)
            .bind(payment.amount)
            .bind(payment.paid_at)
            .bind(&payment.method)
            .bind(&payment.transaction_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn invoice_stats(&self) -> Result<InvoiceStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS invoice_count,
                COALESCE(SUM(total), 0) AS total_spend,
                COALESCE(AVG(total), 0) AS average_total
            FROM invoices
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(InvoiceStats {
            invoice_count: row.try_get("invoice_count")?,
            total_spend: row.try_get::<Decimal, _>("total_spend")?,
            average_total: row.try_get::<Decimal, _>("average_total")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::run_ingest;
    use chrono::Utc;
    use serde_json::json;

    /// Smoke test against a real database. Needs `DATABASE_URL` pointing at a
    /// disposable Postgres instance.
    #[tokio::test]
    #[ignore] // Requires database setup
    async fn persists_and_aggregates_against_postgres() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set for tests");
        let store = PgStore::connect(&database_url).await.expect("connect");
        store.init_schema().await.expect("schema");

        let records = vec![json!({
            "_id": "pg-smoke-1",
            "name": "Smoke Invoice",
            "status": "processed",
            "createdAt": { "$date": "2024-01-01T00:00:00Z" },
            "updatedAt": { "$date": "2024-01-02T00:00:00Z" },
            "extractedData": { "llmData": {
                "vendor": { "value": { "vendorName": { "value": "Smoke Vendor" } } },
                "customer": { "value": { "customerName": { "value": "Smoke Customer" } } },
                "summary": { "value": {
                    "subTotal": { "value": 100 },
                    "invoiceTotal": { "value": 120 }
                } }
            } }
        })];

        let summary = run_ingest(&store, &records, Utc::now().date_naive())
            .await
            .expect("run");
        assert_eq!(summary.processed, 1);
        assert!(summary.stats.invoice_count >= 1);
    }
}
