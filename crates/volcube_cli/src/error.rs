//! CLI error types.

use thiserror::Error;
use volcube_core::market_data::MarketDataError;
use volcube_core::types::DateError;
use volcube_models::smile::SmileError;
use volcube_optimiser::cube::CubeError;
use volcube_optimiser::market_model::CoterminalError;

/// Errors raised while loading inputs or running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Input or configuration file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Configuration is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input file could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Offending file
        path: String,
        /// Parser message
        message: String,
    },

    /// Command-line or input value is invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Date, period or day-count parse failure.
    #[error(transparent)]
    Date(#[from] DateError),

    /// ATM matrix construction failure.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Cube calibration or query failure.
    #[error(transparent)]
    Cube(#[from] CubeError),

    /// Smile evaluation failure.
    #[error(transparent)]
    Smile(#[from] SmileError),

    /// Coterminal calibration precondition failure.
    #[error(transparent)]
    Coterminal(#[from] CoterminalError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialisation failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
