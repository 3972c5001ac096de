//! CLI entry point for seismolog.
//!
//! Two subcommands:
//! - `run`: start the logging daemon until Ctrl-C.
//! - `dump`: print the contents of a recorded day file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use seismolog::record::{DayRecord, MILLI_G_PER_COUNT, RECORD_LEN};
use seismolog::{dayfile, logging, Config, MockAdxl345, SeismoLogger};

#[derive(Parser)]
#[command(name = "seismolog")]
#[command(about = "Day-partitioned accelerometer logging daemon", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the logging daemon until interrupted
    Run {
        /// Configuration file (TOML)
        #[arg(long, default_value = seismolog::config::DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Print the records of a day file
    Dump {
        /// Path to a YYYY-MM-DD day file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => run_daemon(config).await,
        Commands::Dump { file } => dump_file(&file),
    }
}

async fn run_daemon(config_path: PathBuf) -> Result<()> {
    let config = Config::load_from(&config_path)
        .with_context(|| format!("loading configuration from {}", config_path.display()))?;
    logging::init(&config.application.log_level)?;

    let logger = SeismoLogger::new(config, Box::new(MockAdxl345::new()));
    let mut rotations = logger
        .start()
        .context("starting the logging daemon")?;

    // Stand-in catalog notifier: record completed day files in the log.
    let notifier = tokio::spawn(async move {
        while let Some(event) = rotations.recv().await {
            info!(path = %event.path.display(), "day file completed");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");

    logger.stop();
    notifier.abort();
    Ok(())
}

fn dump_file(path: &PathBuf) -> Result<()> {
    let day_start = dayfile::day_from_path(path)?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading day file {}", path.display()))?;

    for chunk in bytes.chunks_exact(RECORD_LEN) {
        let record = DayRecord::decode(chunk)?;
        let secs = day_start + i64::from(record.ms_of_day / 1000);
        let timestamp = chrono::DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| secs.to_string());
        println!(
            "{}.{:03} {:9.2} {:9.2} {:9.2}",
            timestamp,
            record.ms_of_day % 1000,
            f64::from(record.x) * MILLI_G_PER_COUNT,
            f64::from(record.y) * MILLI_G_PER_COUNT,
            f64::from(record.z) * MILLI_G_PER_COUNT,
        );
    }

    let remainder = bytes.len() % RECORD_LEN;
    if remainder != 0 {
        eprintln!("warning: {remainder} trailing bytes ignored");
    }
    Ok(())
}
