//! Ladder entry gatekeeper - operator CLI
//!
//! status: kill switch, open positions, day P&L and drawdown
//! config: live params as JSON
//! test:   dry-run the gates for one asset

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ladder_bot::snapshot::read_diagnostics;
use ladder_bot::{AppConfig, Application};
use ladder_core::{AssetId, EngineDiagnostics};
use ladder_telemetry::Metrics;
use std::path::PathBuf;
use tracing::info;

/// Ladder entry gatekeeper
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LADDER_CONFIG env var)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start with the kill switch off
    #[arg(long)]
    disable: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show gatekeeper status
    Status,
    /// Dump live params as JSON
    Config,
    /// Dry-run the entry gates for one asset
    Test {
        /// Asset id (mint or symbol)
        asset: String,
        /// Engine diagnostics JSON file
        #[arg(long)]
        diag: Option<PathBuf>,
        /// Provider snapshot JSON file (overrides snapshot_path)
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Print Prometheus metrics after the evaluation
        #[arg(long)]
        metrics: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > LADDER_CONFIG env var > default
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    ladder_telemetry::init_logging(Some(&config.telemetry.log_level))?;
    info!("Starting ladder-bot v{}", env!("CARGO_PKG_VERSION"));

    if let Command::Test {
        snapshot: Some(path),
        ..
    } = &args.command
    {
        config.snapshot_path = Some(path.clone());
    }

    let app = Application::new(config).context("failed to start gatekeeper")?;
    if args.disable {
        app.set_enabled(false);
    }

    match args.command {
        Command::Status => {
            println!("{}", app.status_text());
        }
        Command::Config => {
            println!("{}", app.config_json()?);
        }
        Command::Test {
            asset,
            diag,
            metrics,
            ..
        } => {
            let asset: AssetId = asset.parse()?;
            let diag = match diag {
                Some(path) => read_diagnostics(&path)?,
                None => EngineDiagnostics::default(),
            };
            let report = app.dry_run(&asset, &diag).await;
            println!("{report}");
            if metrics {
                println!("{}", Metrics::render()?);
            }
        }
    }

    Ok(())
}
