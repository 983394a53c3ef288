mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use soltaro_bridge::daemon::{self, Daemon};
use soltaro_bridge::{Config, Pipeline, logging};
use tracing::{info, warn};

use crate::cli::{Args, Command, PollOnceArgs};

fn main() -> Result<()> {
    let args = Args::parse();

    // Environment must be settled before the runtime spawns worker threads
    match dotenvy::from_path_override(&args.env_file) {
        Ok(()) => {}
        Err(e) if e.not_found() => {}
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", args.env_file.display()));
        }
    }

    let config_path = cli::resolve_config_path(args.config, std::env::var_os("SOLTARO_CONFIG"));
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.validate()?;
    logging::init_logging(&config.logging)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    runtime.block_on(run(args.command, config))
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::ListInverters => {
            let mut pipeline = Pipeline::from_config(&config)?;
            for node in pipeline.list_inverters().await? {
                println!("{node}");
            }
            Ok(())
        }

        Command::PollOnce(PollOnceArgs { json, no_push }) => {
            if !no_push {
                config.hubitat.validate()?;
            }
            let mut pipeline = Pipeline::from_config(&config)?;
            let snapshot = pipeline.poll_once(!no_push).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                let prefix = if no_push { "Fetched" } else { "Pushed to Hubitat" };
                println!(
                    "{prefix} | SOC={}% | battery={}W ({})",
                    format_value(snapshot.get(soltaro_bridge::snapshot::metric::BATTERY_SOC)),
                    format_value(snapshot.get(soltaro_bridge::snapshot::metric::BATTERY_POWER)),
                    snapshot.battery_state()
                );
            }
            Ok(())
        }

        Command::Daemon => {
            config.hubitat.validate()?;
            let mut pipeline = Pipeline::from_config(&config)?;
            let (stop, stop_rx) = daemon::stop_signal();

            tokio::spawn(async move {
                wait_for_shutdown().await;
                info!("Shutdown signal received");
                stop.stop();
            });

            let stats = Daemon::new(config.poll_interval())
                .run(&mut pipeline, stop_rx)
                .await;
            info!(cycles = stats.cycles, failures = stats.failures, "Daemon shutdown complete");
            Ok(())
        }
    }
}

fn format_value(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => "None".to_string(),
    }
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("SIGTERM handler unavailable: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
