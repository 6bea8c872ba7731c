//! gateway-balancer - load balancing core host
//!
//! Loads the balancer configuration, registers the configured services, runs
//! the recovery and affinity maintenance loops and periodically logs
//! statistics until interrupted.

#![allow(missing_docs)]

use anyhow::Context;
use clap::Parser;
use gateway_balancer::utils::logging::init_tracing;
use gateway_balancer::{Config, LoadBalancerManager, build_info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "balancer", version, about = "API gateway load balancing core")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "BALANCER_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds between statistics log lines (0 disables)
    #[arg(long, env = "BALANCER_STATS_INTERVAL_SECS", default_value_t = 60)]
    stats_interval_secs: u64,

    /// Validate the configuration, print it and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli).await?;

    if cli.check {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    init_tracing(&config.logging)?;

    let build = build_info();
    info!(
        "Starting balancer {} (git {}, built {})",
        build.version, build.git_hash, build.build_time
    );

    let balancer = Arc::new(LoadBalancerManager::from_config(&config)?);
    let maintenance = balancer.start_maintenance();

    if cli.stats_interval_secs > 0 {
        let mut ticker = tokio::time::interval(Duration::from_secs(cli.stats_interval_secs));
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => log_stats(&balancer),
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for shutdown signal")?;
                    break;
                }
            }
        }
    } else {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for shutdown signal")?;
    }

    info!("Shutdown signal received");
    maintenance.shutdown();
    Ok(())
}

async fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::default(),
    };

    config
        .apply_env_overrides(std::env::vars())
        .context("Invalid environment override")?;
    config.validate()?;
    Ok(config)
}

fn log_stats(balancer: &LoadBalancerManager) {
    let stats = balancer.get_global_stats();
    info!(
        services = stats.total_services,
        instances = stats.total_instances,
        eligible = stats.eligible_instances,
        open_circuits = stats.open_circuits,
        recovering = stats.recovering_instances,
        active_connections = stats.active_connections,
        affinity_entries = stats.affinity_entries,
        "Balancer statistics"
    );
}
