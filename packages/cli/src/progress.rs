//! Progress bar utilities for the CLI.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io::Write;

use colored::Colorize;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use progcp_copy::{ProgressSample, TreeProgressSample};

const FILE_TEMPLATE: &str =
    "  {prefix:<30} [{bar:25.green/dim}] {bytes}/{total_bytes} {bytes_per_sec} {eta}";
const TREE_TEMPLATE: &str =
    "  {prefix:<30} [{bar:25.green/dim}] {bytes}/{total_bytes} {msg} {eta}";

/// Progress bar manager for copy operations.
pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    /// Create a new progress manager.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Create a byte progress bar for a single-file copy.
    ///
    /// If progress is disabled, returns a hidden progress bar.
    #[must_use]
    pub fn create_file_bar(&self, label: &str, total: u64) -> ProgressBar {
        self.create_bar(label, total, FILE_TEMPLATE)
    }

    /// Create a byte progress bar for a tree copy; the message shows file counts.
    ///
    /// If progress is disabled, returns a hidden progress bar.
    #[must_use]
    pub fn create_tree_bar(&self, label: &str, total: u64) -> ProgressBar {
        self.create_bar(label, total, TREE_TEMPLATE)
    }

    fn create_bar(&self, label: &str, total: u64, template: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━━─");

        let pb = ProgressBar::new(total);
        pb.set_style(style);
        pb.set_prefix(label.to_string());
        pb
    }

    /// Print a completed copy result line.
    pub fn print_result(&self, label: &str, bytes: u64, file_count: Option<u64>) {
        let size = HumanBytes(bytes).to_string();
        match file_count {
            Some(count) => println!(
                "{} {:<30} {} ({} files)",
                "✓".green(),
                label,
                size.dimmed(),
                count
            ),
            None => println!("{} {:<30} {}", "✓".green(), label, size.dimmed()),
        }
        let _ = std::io::stdout().flush();
    }
}

/// Move a file bar to match a sample.
pub fn apply_file_sample(bar: &ProgressBar, sample: &ProgressSample) {
    bar.set_length(sample.total);
    bar.set_position(sample.copied());
}

/// Move a tree bar to match a sample.
pub fn apply_tree_sample(bar: &ProgressBar, sample: &TreeProgressSample) {
    bar.set_length(sample.bytes_total);
    bar.set_position(sample.bytes_copied);
    bar.set_message(format!(
        "{}/{} files",
        sample.files_copied, sample.files_total
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_disabled_manager_hides_bars() {
        let manager = ProgressManager::new(false);
        assert!(manager.create_file_bar("a.bin", 10).is_hidden());
        assert!(manager.create_tree_bar("dir", 10).is_hidden());
    }

    #[test]
    fn test_file_sample_includes_resume_offset() {
        let bar = ProgressBar::hidden();
        apply_file_sample(&bar, &ProgressSample::new(1000, 400, 100));
        assert_eq!(bar.length(), Some(1000));
        assert_eq!(bar.position(), 500);
    }

    #[test]
    fn test_tree_sample_sets_counts() {
        let bar = ProgressBar::hidden();
        let sample = TreeProgressSample {
            files_total: 2,
            files_copied: 1,
            bytes_total: 150,
            bytes_copied: 100,
            percent: 66.7,
            current_file: PathBuf::from("a.txt"),
            file: ProgressSample::completed(100, 0, 100),
        };

        apply_tree_sample(&bar, &sample);

        assert_eq!(bar.position(), 100);
        assert_eq!(bar.message(), "1/2 files");
    }
}
