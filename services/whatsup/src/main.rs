//! whatsup CLI
//!
//! Runs the endpoint checks once, or on a fixed schedule until interrupted.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use whatsup::{load_config, RunSummary};

#[derive(Parser)]
#[command(name = "whatsup")]
#[command(about = "HTTP endpoint uptime checks with change-only webhook notifications")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Repeat the checks every N minutes until interrupted
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    interval_minutes: Option<u64>,

    /// Print each run summary to stdout as JSON
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

fn print_summary(summary: &RunSummary) {
    match serde_json::to_string(summary) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Failed to serialize run summary: {}", e),
    }
}

fn schedule_interval(minutes: u64) -> Duration {
    Duration::from_secs(minutes.saturating_mul(60))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, interval_minutes={:?}, json={}, log_level={:?}",
        args.config,
        args.interval_minutes,
        args.json,
        args.log_level
    );

    let config = load_config(&args.config)?;
    tracing::debug!(
        "Endpoints: {}, Notification channels: {}",
        config.endpoints.len(),
        config.notification.len()
    );

    match args.interval_minutes {
        Some(minutes) => {
            let cancel = CancellationToken::new();
            let cancel_for_signal = cancel.clone();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for ctrl-c: {}", e);
                    return;
                }
                tracing::info!("Shutdown signal received");
                cancel_for_signal.cancel();
            });

            whatsup::run_scheduled(
                &config,
                schedule_interval(minutes),
                cancel,
                |summary| {
                    if args.json {
                        print_summary(summary);
                    }
                },
            )
            .await?;
        }
        None => {
            let summary = whatsup::run_once(&config).await?;
            if args.json {
                print_summary(&summary);
            }
        }
    }

    Ok(())
}
