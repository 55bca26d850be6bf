//! TOML configuration file loader.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::Config;

/// Load and validate a TOML configuration file.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// * If the file cannot be read
/// * If the file cannot be parsed as TOML
/// * If a value is out of range
pub fn load_toml_config(path: &Path) -> Result<Config, ConfigError> {
    log::debug!("Loading TOML config from {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&config, path)?;

    log::debug!("Loaded config: {config:?}");

    Ok(config)
}

fn validate(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if config.buffer_size == Some(0) {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            key: "buffer-size",
            message: "must be greater than zero".to_string(),
        });
    }
    if config.report_interval_ms == Some(0) {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            key: "report-interval-ms",
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}
