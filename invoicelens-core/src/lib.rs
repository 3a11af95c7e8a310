//! InvoiceLens core: the ingestion side of the invoice-analytics platform.
//!
//! The crate normalizes raw LLM-extracted invoice records into a relational
//! schema (vendors, customers, invoices, line items, payments). The HTTP
//! read layer that serves aggregations over this data lives elsewhere; this
//! crate only guarantees that the rows it writes are compatible with those
//! queries (valid foreign keys, non-null totals, parseable dates).

pub mod ingest;
pub mod models;
pub mod store;
