//! CLI argument definitions.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use progcp_config::Config;

/// CLI arguments for progcp.
#[derive(Debug, Parser)]
#[command(
    name = "progcp",
    about = "Copy files and directories with progress, cancellation and resume",
    version
)]
pub struct Args {
    /// File or directory to copy.
    #[arg(index = 1)]
    pub source: PathBuf,

    /// Exact destination path: the file to write, or the directory the tree is copied as.
    #[arg(index = 2)]
    pub destination: PathBuf,

    /// Only copy files with this extension (directory copies, repeatable).
    #[arg(long = "ext", short = 'e')]
    pub extensions: Vec<String>,

    /// Copy buffer size in bytes.
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Progress report interval in milliseconds.
    #[arg(long = "interval-ms", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,

    /// Resume a file copy at this byte offset.
    #[arg(long, conflicts_with = "resume")]
    pub offset: Option<u64>,

    /// Resume a file copy from the destination's current length.
    #[arg(long)]
    pub resume: bool,

    /// Give up after this many seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Config file to use instead of the discovered one.
    #[arg(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Disable progress bars (useful for CI environments).
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Enable verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Args {
    /// Whether a resume was requested in either form.
    #[must_use]
    pub const fn is_resume(&self) -> bool {
        self.resume || self.offset.is_some()
    }

    /// Determine if we should show progress bars.
    #[must_use]
    pub fn should_show_progress(&self, config: &Config) -> bool {
        !self.no_progress && config.progress.unwrap_or(true)
    }

    /// Buffer size from the flag, falling back to the config file.
    #[must_use]
    pub fn buffer_size(&self, config: &Config) -> Option<usize> {
        self.buffer_size.or(config.buffer_size)
    }

    /// Report interval from the flag, falling back to the config file.
    #[must_use]
    pub fn report_interval(&self, config: &Config) -> Option<Duration> {
        self.interval_ms
            .map(Duration::from_millis)
            .or_else(|| config.report_interval())
    }

    /// Extension filter; flags replace the configured list rather than extend it.
    #[must_use]
    pub fn extensions<'a>(&'a self, config: &'a Config) -> &'a [String] {
        if self.extensions.is_empty() {
            &config.extensions
        } else {
            &self.extensions
        }
    }

    /// The `--timeout` value as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}
