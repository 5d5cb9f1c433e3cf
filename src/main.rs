//! BETMO — two-player daily guessing game.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! seeds missing participant records, and serves the HTTP API until
//! Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use betmo::api;
use betmo::config::{AppConfig, DEFAULT_CONFIG_FILE};
use betmo::engine::Ledger;
use betmo::storage::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path =
        std::env::var("BETMO_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let (cfg, found) = AppConfig::load_or_default(&config_path)?;
    if !found {
        warn!(path = %config_path, "Config file not found, using defaults");
    }

    info!(
        first = %cfg.participants.first,
        second = %cfg.participants.second,
        root = %cfg.storage.root.display(),
        close_round_on_settle = cfg.rules.close_round_on_settle,
        strict_transfer_target = cfg.rules.strict_transfer_target,
        "BETMO starting up"
    );

    let store = Arc::new(FileStore::from_config(&cfg.storage));
    let ledger = Arc::new(Ledger::new(store, cfg.participants.clone(), cfg.rules));

    if cfg.storage.seed_missing_records {
        let created = ledger
            .seed_missing_records(cfg.storage.initial_balance)
            .await?;
        if created > 0 {
            info!(created, "Seeded missing participant records");
        }
    }

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    api::serve(ledger, &addr, shutdown_signal()).await?;

    info!("BETMO shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("betmo=info"));

    let json_logging = std::env::var("BETMO_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
