// Statement Ingest - Web Server
// REST API for statement uploads with Axum

use anyhow::{Context, Result};
use clap::Parser;
use statement_ingest::api::{router, AppState};
use statement_ingest::config::{setup_logging, ServerConfig};
use statement_ingest::{count_transactions, open_database, supported_banks, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::parse();
    setup_logging(&config.log_level)?;

    tracing::info!(version = VERSION, "🌐 statement ingest server starting");

    // Open database
    let conn = open_database(&config.database_path)?;
    let existing = count_transactions(&conn)?;
    tracing::info!(
        path = %config.database_path.display(),
        transactions = existing,
        "✓ database opened"
    );

    let app = router(AppState::new(conn));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!(
        addr = %config.bind_addr,
        banks = ?supported_banks(),
        "🚀 listening (POST /transactions/upload?bank=<id>, GET /transactions)"
    );

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
