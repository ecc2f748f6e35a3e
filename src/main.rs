//! Jackpot service binary
//!
//! Loads configuration, wires the raffle service, starts the upkeep ticker,
//! and serves the HTTP API.

use clap::Parser;
use jackpot::api::ApiServer;
use jackpot::{ConfigLoader, RaffleService};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "jackpot", about = "Pooled-stake raffle service")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// How often the automation agent polls for settlement eligibility
    #[arg(long, default_value_t = 5)]
    upkeep_poll_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jackpot=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = loader.load()?;

    info!(
        entrance_fee = config.raffle.entrance_fee,
        interval_secs = config.raffle.interval_secs,
        "starting jackpot raffle service"
    );

    let service = RaffleService::new(&config);
    let _ticker = service.spawn_upkeep_ticker(Duration::from_secs(cli.upkeep_poll_secs));

    if config.api.enabled {
        ApiServer::new(config.api.clone(), &service).run().await?;
    } else {
        info!("API disabled, running headless until interrupted");
        tokio::signal::ctrl_c().await?;
    }

    service.abort_background_tasks();
    Ok(())
}
