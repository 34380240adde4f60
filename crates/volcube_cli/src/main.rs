//! volcube CLI - swaption volatility cube and coterminal calibration
//!
//! # Commands
//!
//! - `volcube cube <file>` - build a SABR or spread cube from a TOML market
//!   file and report smiles
//! - `volcube coterminal <file>` - calibrate market-model pseudo-roots to
//!   coterminal swaption and caplet volatilities
//!
//! # Configuration
//!
//! Settings are read from `--config` (TOML), then `VOLCUBE_LOG_LEVEL` and
//! `VOLCUBE_FORMAT`, then command-line flags; later sources win.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use commands::cube::CubeModel;
use config::{build_config, CliArgs};

/// Swaption volatility cube calibration
#[derive(Parser)]
#[command(name = "volcube")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a volatility cube and report smiles
    Cube {
        /// Path to the TOML market file
        file: String,

        /// Smile model
        #[arg(short, long, value_enum, default_value = "sabr")]
        model: CubeModel,
    },

    /// Calibrate pseudo-roots to coterminal swaptions and caplets
    Coterminal {
        /// Path to the TOML market-model file
        file: String,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = build_config(&CliArgs {
        config_file: cli.config,
        log_level: cli.log_level,
        format: cli.format,
        verbose: cli.verbose,
    })?;

    init_tracing(config.log_level.as_filter_str());
    info!(
        log_level = %config.log_level,
        format = ?config.format,
        atm_calibrated = config.cube.atm_calibrated,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Cube { file, model } => commands::cube::run(&file, model, config.cube, config.format)?,
        Commands::Coterminal { file } => commands::coterminal::run(&file, config.format)?,
    }
    Ok(())
}
