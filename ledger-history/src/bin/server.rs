//! Ledger history storage daemon
//!
//! Opens the RocksDB store, provisioning a column family per table, reports
//! what it holds and stays up until interrupted.

use anyhow::Context;
use ledger_history::{Config, RocksStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting ledger history server");

    // Load configuration
    let config = match std::env::var("HISTORY_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env().context("reading HISTORY_* environment")?,
    };

    let store = RocksStore::open(&config).context("opening RocksDB")?;

    let stats = store.get_stats()?;
    for (table, rows) in &stats.tables {
        tracing::debug!(table = %table, rows, "Table size");
    }
    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        path = ?config.data_dir,
        rows = stats.total_rows(),
        "Store opened"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down ledger history server");
    store.close()?;
    Ok(())
}
