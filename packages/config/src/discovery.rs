//! Configuration file discovery.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = "progcp.toml";

/// Candidate configuration files, most specific first.
///
/// * `<cwd>/progcp.toml`
/// * `<user config dir>/progcp/config.toml`
#[must_use]
pub fn config_candidates(cwd: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join(LOCAL_CONFIG_NAME)];
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("progcp").join("config.toml"));
    }
    candidates
}

/// Find the first existing configuration file.
#[must_use]
pub fn discover_config(cwd: &Path) -> Option<PathBuf> {
    let found = config_candidates(cwd).into_iter().find(|p| p.is_file());
    match &found {
        Some(path) => log::debug!("Found config file {}", path.display()),
        None => log::debug!("No config file found"),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_local_config_comes_first() {
        let dir = TempDir::new().unwrap();
        let candidates = config_candidates(dir.path());
        assert_eq!(candidates[0], dir.path().join(LOCAL_CONFIG_NAME));
    }

    #[test]
    fn test_discover_local_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LOCAL_CONFIG_NAME), "").unwrap();

        assert_eq!(
            discover_config(dir.path()),
            Some(dir.path().join(LOCAL_CONFIG_NAME))
        );
    }
}
