use chrono::Utc;
use dotenv::dotenv;
use serde_json::Value;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use invoicelens_core::ingest::{run_ingest, RunSummary};
use invoicelens_core::store::{MemoryStore, PgStore};

/// Seed binary entry point: one-time, best-effort ETL from the raw
/// extraction export into the analytics schema.
///
/// Configuration comes from the environment (and `.env`):
/// - `DATABASE_URL` - target Postgres instance (unless dry-running)
/// - `SEED_DATA_PATH` - export file, overridable by the first CLI argument
/// - `INGEST_DRY_RUN` - set to `1`/`true` to run against the in-memory store
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(LevelFilter::INFO.into());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting database seed...");

    // A failure to read or parse the export is fatal: no partial run begins.
    let data_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SEED_DATA_PATH").ok())
        .unwrap_or_else(|| "data/Analytics_Test_Data.json".to_string());
    let raw = std::fs::read_to_string(&data_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", data_path, e))?;
    let records: Vec<Value> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", data_path, e))?;

    let today = Utc::now().date_naive();

    let dry_run = std::env::var("INGEST_DRY_RUN")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let summary = if dry_run {
        info!("Dry run: writing to the in-memory store");
        let store = MemoryStore::new();
        run_ingest(&store, &records, today).await?
    } else {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is not set"))?;
        let store = PgStore::connect(&database_url).await?;
        store.init_schema().await?;

        // Release the pool before surfacing any fatal error.
        let result = run_ingest(&store, &records, today).await;
        store.close().await;
        result?
    };

    report(&summary);

    Ok(())
}

/// Logs the operator-facing run summary.
fn report(summary: &RunSummary) {
    info!("Seed completed!");
    info!("  - Processed: {}", summary.processed);
    info!("  - Skipped: {}", summary.skipped);
    info!("Database summary:");
    info!("  - Total invoices: {}", summary.stats.invoice_count);
    info!("  - Total spend: {}", summary.stats.total_spend.round_dp(2));
    info!(
        "  - Average invoice: {}",
        summary.stats.average_total.round_dp(2)
    );
}
