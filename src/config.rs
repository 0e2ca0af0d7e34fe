//! Runtime configuration, read from the environment at startup.
//!
//! A `.env` file in the working directory is honoured outside of tests.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

pub const DATA_PATH_VAR: &str = "TRACKER_DATA_PATH";
pub const LOG_VAR: &str = "RUST_LOG";
pub const DEFAULT_DATA_PATH: &str = "tracker.json";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// JSON file backing the key/value store
    pub data_path: PathBuf,
    /// `tracing` filter directive, e.g. `info` or `macro_tracker=debug`
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_path = lookup(DATA_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let log_filter = lookup(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        EnvFilter::try_new(&log_filter).map_err(|e| {
            ConfigError::InvalidValue(
                LOG_VAR.to_string(),
                format!("'{}' is not a valid log filter: {}", log_filter, e),
            )
        })?;

        Ok(Self {
            data_path,
            log_filter,
        })
    }
}
