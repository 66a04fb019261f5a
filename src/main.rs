use std::sync::Arc;

use anyhow::{Context, Result};
use asset_ledger::{
    config::Config,
    db::Database,
    server::{Controllers, Server},
};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let repository = Database::connect(&config.storage)
        .await
        .context("Failed to open storage")?;
    let controller = Arc::new(Controllers::new(repository));
    let server = Server::new(controller, config.bind_address);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    server.start(shutdown_rx).await
}
