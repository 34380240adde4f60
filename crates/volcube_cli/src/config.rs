//! CLI configuration management
//!
//! Settings come from a TOML file, environment variables and command-line
//! flags. Priority (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Config file
//! 4. Default values

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use volcube_optimiser::cube::CubeConfig;

use crate::{CliError, Result};

/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "VOLCUBE_LOG_LEVEL";
/// Environment variable overriding the report format.
pub const FORMAT_ENV: &str = "VOLCUBE_FORMAT";

/// Log levels accepted by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(CliError::Config(format!(
                "Invalid log level: {s}. Must be one of: trace, debug, info, warn, error"
            ))),
        }
    }
}

impl LogLevel {
    /// Tracing filter directive for this level.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(CliError::Config(format!(
                "Invalid output format: {s}. Must be one of: table, json"
            ))),
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Log level
    pub log_level: LogLevel,
    /// Report format
    pub format: OutputFormat,
    /// SABR cube calibration settings
    pub cube: CubeConfig,
}

/// Overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Log level override
    pub log_level: Option<String>,
    /// Report format override
    pub format: Option<String>,
    /// Shorthand for `--log-level debug`
    pub verbose: bool,
}

impl CliConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::Config(format!("Failed to parse TOML: {e}")))
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = level.parse()?;
        }
        if let Some(format) = lookup(FORMAT_ENV) {
            self.format = format.parse()?;
        }
        Ok(())
    }

    /// Merge with CLI arguments (CLI takes precedence).
    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<()> {
        if let Some(level) = &cli.log_level {
            self.log_level = level.parse()?;
        } else if cli.verbose {
            self.log_level = LogLevel::Debug;
        }
        if let Some(format) = &cli.format {
            self.format = format.parse()?;
        }
        Ok(())
    }

    /// Validate the cube settings.
    pub fn validate(&self) -> Result<()> {
        self.cube
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

/// Build configuration from all sources.
///
/// A missing config file is only an error when it was named explicitly.
pub fn build_config(cli: &CliArgs) -> Result<CliConfig> {
    let mut config = match &cli.config_file {
        Some(path) if path.exists() => CliConfig::from_file(path)?,
        Some(path) => return Err(CliError::FileNotFound(path.display().to_string())),
        None => CliConfig::default(),
    };

    config.apply_env_with(|name| std::env::var(name).ok())?;
    config.merge_with_cli(cli)?;
    config.validate()?;

    Ok(config)
}
