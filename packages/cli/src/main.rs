//! progcp CLI entry point.
//!
//! Copies a file or a directory tree with a live progress bar. Ctrl-C or
//! `--timeout` stops the copy cleanly, and an interrupted file copy can be
//! picked up again with `--resume` or `--offset`.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod args;
mod output;
mod progress;
mod signal;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;

use args::Args;
use progcp_config::{Config, load_config};
use progcp_copy::{
    CancelToken, CopyFailure, FileCopyOptions, TreeCopyOptions, copy_file, copy_tree,
};
use progress::ProgressManager;

/// Exit status after a cancelled copy, as for a process killed by SIGINT.
const EXIT_CANCELLED: i32 = 130;

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Cancelled,
}

fn main() {
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        // SAFETY: We're setting this before any other threads are spawned
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    pretty_env_logger::init();

    match run(&args) {
        Ok(Outcome::Completed) => {}
        Ok(Outcome::Cancelled) => std::process::exit(EXIT_CANCELLED),
        Err(e) => {
            output::print_error(&e.to_string());
            std::process::exit(1);
        }
    }
}

/// Main application logic.
fn run(args: &Args) -> Result<Outcome, Box<dyn std::error::Error>> {
    let cwd = env::current_dir()?;

    let loaded = load_config(args.config.as_deref(), &cwd)?;
    if let Some(path) = &loaded.config_path {
        output::print_config_path(path);
    }
    let config = &loaded.config;

    let source = absolute(&cwd, &args.source);
    let destination = absolute(&cwd, &args.destination);

    let mut cancel = CancelToken::new();
    signal::cancel_on_interrupt(&cancel);
    if let Some(timeout) = args.timeout() {
        log::debug!("Copy times out after {timeout:?}");
        cancel = cancel.with_timeout(timeout);
    }

    let progress_mgr = ProgressManager::new(progress_enabled(args, config));

    output::print_copy_header(&source, &destination);

    if fs::metadata(&source).is_ok_and(|m| m.is_dir()) {
        if args.is_resume() {
            return Err("--offset and --resume only apply to single-file copies".into());
        }
        copy_directory(args, config, &source, &destination, cancel, &progress_mgr)
    } else {
        copy_single_file(args, config, &source, &destination, cancel, &progress_mgr)
    }
}

fn copy_single_file(
    args: &Args,
    config: &Config,
    source: &Path,
    destination: &Path,
    cancel: CancelToken,
    progress_mgr: &ProgressManager,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    if !args.extensions(config).is_empty() {
        output::print_warning("--ext is ignored for single-file copies");
    }

    let offset = resume_offset(args, destination);
    if offset > 0 {
        output::print_resume(offset);
    }

    let total = fs::metadata(source).map(|m| m.len()).unwrap_or(0);
    let bar = progress_mgr.create_file_bar(&label(source), total);
    bar.set_position(offset);

    let mut options = FileCopyOptions::new()
        .with_resume_offset(offset)
        .with_cancel(cancel);
    if let Some(size) = args.buffer_size(config) {
        options = options.with_buffer_size(size);
    }
    if let Some(interval) = args.report_interval(config) {
        options = options.with_report_interval(interval);
    }
    let file_bar = bar.clone();
    options = options.with_progress(move |sample| progress::apply_file_sample(&file_bar, sample));

    let result = copy_file(source, destination, &options);
    bar.finish_and_clear();

    match result {
        Ok(written) => {
            progress_mgr.print_result(&label(source), offset + written, None);
            Ok(Outcome::Completed)
        }
        Err(failure) => {
            let resume_at = offset + failure.written;
            let hint = output::resume_command(source, destination, resume_at);
            finish_failed(failure, resume_at, Some(&hint))
        }
    }
}

fn copy_directory(
    args: &Args,
    config: &Config,
    source: &Path,
    destination: &Path,
    cancel: CancelToken,
    progress_mgr: &ProgressManager,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let mut options = TreeCopyOptions::new()
        .with_extensions(args.extensions(config))
        .with_cancel(cancel);
    if let Some(size) = args.buffer_size(config) {
        options = options.with_buffer_size(size);
    }
    if let Some(interval) = args.report_interval(config) {
        options = options.with_report_interval(interval);
    }

    // Length is filled in by the first sample, once the tree has been scanned.
    let bar = progress_mgr.create_tree_bar(&label(source), 0);
    let tree_bar = bar.clone();
    let files_copied = Arc::new(AtomicU64::new(0));
    let files_seen = Arc::clone(&files_copied);
    options = options.with_progress(move |sample| {
        files_seen.store(sample.files_copied, Ordering::Relaxed);
        progress::apply_tree_sample(&tree_bar, sample);
    });

    let result = copy_tree(source, destination, &options);
    bar.finish_and_clear();

    match result {
        Ok(written) => {
            let file_count = files_copied.load(Ordering::Relaxed);
            progress_mgr.print_result(&label(source), written, Some(file_count));
            Ok(Outcome::Completed)
        }
        Err(failure) => {
            let written = failure.written;
            finish_failed(failure, written, None)
        }
    }
}

fn finish_failed(
    failure: CopyFailure,
    written: u64,
    resume_hint: Option<&str>,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    if failure.is_cancelled() {
        output::print_cancelled(written, resume_hint);
        Ok(Outcome::Cancelled)
    } else {
        Err(failure.into())
    }
}

/// Byte offset to resume a file copy at.
fn resume_offset(args: &Args, destination: &Path) -> u64 {
    if let Some(offset) = args.offset {
        return offset;
    }
    if args.resume {
        return fs::metadata(destination).map(|m| m.len()).unwrap_or(0);
    }
    0
}

/// Bars are drawn on stderr, so only when someone is watching it.
fn progress_enabled(args: &Args, config: &Config) -> bool {
    args.should_show_progress(config) && console::user_attended_stderr()
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    path_clean::clean(cwd.join(path))
}

fn label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(["progcp", "src", "dst"].iter().chain(extra.iter())).unwrap()
    }

    #[test]
    fn test_absolute_cleans_relative_paths() {
        assert_eq!(
            absolute(Path::new("/work"), Path::new("./out/../data/a.bin")),
            PathBuf::from("/work/data/a.bin")
        );
        assert_eq!(
            absolute(Path::new("/work"), Path::new("/abs/file")),
            PathBuf::from("/abs/file")
        );
    }

    #[test]
    fn test_resume_offset_from_destination_length() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("partial.bin");
        fs::write(&destination, vec![0u8; 321]).unwrap();

        assert_eq!(resume_offset(&args(&["--resume"]), &destination), 321);
        assert_eq!(resume_offset(&args(&["--offset", "7"]), &destination), 7);
        assert_eq!(resume_offset(&args(&[]), &destination), 0);
        assert_eq!(
            resume_offset(&args(&["--resume"]), &dir.path().join("missing")),
            0
        );
    }

    #[test]
    fn test_progress_disabled_by_flag_or_config() {
        let config = Config::default();
        assert!(!progress_enabled(&args(&["--no-progress"]), &config));

        let config = Config {
            progress: Some(false),
            ..Config::default()
        };
        assert!(!progress_enabled(&args(&[]), &config));
    }

    #[test]
    fn test_label_uses_file_name() {
        assert_eq!(label(Path::new("/data/movie.mkv")), "movie.mkv");
    }
}
