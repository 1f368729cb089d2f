//! Chainhead Miner - Main Application

use chainhead_miner::{
    utils::init_logging, ChainClient, Config, Miner, SearchCoordinator, SessionSettings,
    APP_NAME, APP_VERSION,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().await?;

    if config.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    init_logging(&config.log_level, config.log_format);
    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let mode = config.target_mode()?;
    let client = Arc::new(ChainClient::new(
        config.node_url(),
        config.http_timeout_duration(),
        mode,
    )?);
    let coordinator = Arc::new(SearchCoordinator::new(config.pool_threads())?);
    info!(
        "Node {} with {} lanes on {} threads",
        config.node_url(),
        config.lane_count,
        coordinator.threads()
    );

    let miner = Miner::new(
        SessionSettings::from_config(&config),
        mode,
        coordinator,
        client.clone(),
        client,
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Shutdown requested, finishing current batch");
        signal_cancel.cancel();
    });

    let stats = miner.run(cancel).await?;
    info!(
        "Found {} solutions in {} batches",
        stats.solutions_found, stats.batches
    );

    Ok(())
}
