// ABOUTME: Entry point for the cardb binary.
// ABOUTME: Loads configuration from the environment, initializes tracing, and opens the store.

use cardb_store::StoreConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cardb=debug,cardb_store=debug")),
        )
        .init();

    tracing::info!("cardb starting up");

    let config = StoreConfig::from_env()?;
    let store = config.open().await?;

    let tables = store.tables().list_tables().await?;
    tracing::info!(
        "{} table(s) under {}",
        tables.len(),
        config.root().display()
    );
    for table in &tables {
        let rows = store.list_row_ids(table.as_str()).await?;
        tracing::info!("table {}: {} row(s)", table, rows.len());
    }

    Ok(())
}
