//! Configuration types for progcp.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Persisted copy defaults. Every field is optional; command-line flags win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Copy buffer size in bytes.
    #[serde(default)]
    pub buffer_size: Option<usize>,

    /// Progress report interval in milliseconds.
    #[serde(default)]
    pub report_interval_ms: Option<u64>,

    /// Extensions to restrict directory copies to.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Whether to show progress bars.
    #[serde(default)]
    pub progress: Option<bool>,
}

impl Config {
    /// The report interval as a [`Duration`].
    #[must_use]
    pub fn report_interval(&self) -> Option<Duration> {
        self.report_interval_ms.map(Duration::from_millis)
    }
}

/// A loaded configuration with metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// The parsed configuration.
    pub config: Config,
    /// The file it came from, `None` when no file was found.
    pub config_path: Option<PathBuf>,
}
