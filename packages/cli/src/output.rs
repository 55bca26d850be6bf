//! Terminal output formatting.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;

use colored::Colorize;
use indicatif::HumanBytes;

/// Print the copy being started.
pub fn print_copy_header(source: &Path, destination: &Path) {
    println!(
        "Copying {} {} {}",
        source.display().to_string().cyan(),
        "→".dimmed(),
        destination.display().to_string().cyan()
    );
}

/// Print which config file is in use.
pub fn print_config_path(path: &Path) {
    println!("Config: {}", path.display().to_string().yellow());
}

/// Print the resume point of a file copy.
pub fn print_resume(offset: u64) {
    println!("Resuming at byte {offset} ({})", HumanBytes(offset));
}

/// Print how far an interrupted copy got, and how to pick it up again.
pub fn print_cancelled(written: u64, resume_hint: Option<&str>) {
    eprintln!(
        "{} {} copied before cancellation",
        "Cancelled:".yellow().bold(),
        HumanBytes(written)
    );
    if let Some(hint) = resume_hint {
        eprintln!("  {} {}", "resume with".dimmed(), hint);
    }
}

/// Command line that resumes a file copy at `offset`.
#[must_use]
pub fn resume_command(source: &Path, destination: &Path, offset: u64) -> String {
    format!(
        "progcp --offset {offset} {} {}",
        source.display(),
        destination.display()
    )
}

/// Print error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_command() {
        assert_eq!(
            resume_command(Path::new("/data/a.iso"), Path::new("/backup/a.iso"), 4096),
            "progcp --offset 4096 /data/a.iso /backup/a.iso"
        );
    }
}
