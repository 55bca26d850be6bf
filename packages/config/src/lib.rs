//! Configuration loading for progcp.
//!
//! Copy defaults (buffer size, report interval, extension filter, progress
//! display) can be persisted in a TOML file instead of being repeated on
//! every invocation.
//!
//! # Example
//!
//! ```toml
//! buffer-size = 1048576
//! report-interval-ms = 250
//! extensions = [".jpg", ".png"]
//! progress = true
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod discovery;
mod error;
mod toml_loader;
mod types;

pub use discovery::{LOCAL_CONFIG_NAME, config_candidates, discover_config};
pub use error::ConfigError;
pub use toml_loader::load_toml_config;
pub use types::{Config, LoadedConfig};

use std::path::Path;

/// Load the configuration.
///
/// An explicit path must exist. Without one, the first discovered file is
/// used, and defaults apply when there is none.
///
/// # Arguments
///
/// * `explicit` - Path given on the command line, if any
/// * `cwd` - Directory to look for a local config in
///
/// # Errors
///
/// * If the file cannot be read or parsed
/// * If a value is invalid
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<LoadedConfig, ConfigError> {
    let Some(path) = explicit.map(Path::to_path_buf).or_else(|| discover_config(cwd)) else {
        return Ok(LoadedConfig::default());
    };

    let config = load_toml_config(&path)?;

    Ok(LoadedConfig {
        config,
        config_path: Some(path),
    })
}
