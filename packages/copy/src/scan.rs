//! Pre-scan of a source tree: file count, directory count and total size.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;

use crate::error::CopyError;
use crate::options::ExtensionFilter;
use crate::source::{EntryKind, HostFs, SourceFs};

/// Snapshot of a source tree taken before a tree copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeInfo {
    /// Regular files passing the extension filter.
    pub file_count: u64,
    /// Directories visited, the root included.
    pub sub_dir_count: u64,
    /// Combined size of the counted files.
    pub total_size: u64,
    /// The filter the scan was made with.
    pub extensions: ExtensionFilter,
}

/// Scan a tree on the host file system.
///
/// # Errors
///
/// * See [`scan_tree_from`]
pub fn scan_tree(root: &Path, extensions: &ExtensionFilter) -> Result<TreeInfo, CopyError> {
    scan_tree_from(&HostFs, root, extensions)
}

/// Scan the tree at `root` in `source_fs`.
///
/// Directories are counted but never matched against `extensions`. Entries
/// that are neither regular files nor directories are ignored.
///
/// # Errors
///
/// * [`CopyError::Walk`] if any entry cannot be read; the scan never skips errors
pub fn scan_tree_from<S>(
    source_fs: &S,
    root: &Path,
    extensions: &ExtensionFilter,
) -> Result<TreeInfo, CopyError>
where
    S: SourceFs + ?Sized,
{
    log::debug!("Scanning {}", root.display());

    let mut info = TreeInfo {
        extensions: extensions.clone(),
        ..TreeInfo::default()
    };

    source_fs.walk(root, &mut |entry| {
        match entry.kind {
            EntryKind::Dir => info.sub_dir_count += 1,
            EntryKind::File if extensions.matches(&entry.path) => {
                let metadata = source_fs
                    .metadata(&entry.path)
                    .map_err(|e| CopyError::Walk {
                        path: entry.path.clone(),
                        message: e.to_string(),
                    })?;
                info.file_count += 1;
                info.total_size += metadata.len;
            }
            EntryKind::File | EntryKind::Other => {}
        }
        Ok(())
    })?;

    log::debug!(
        "Scanned {}: {} files, {} dirs, {} bytes",
        root.display(),
        info.file_count,
        info.sub_dir_count,
        info.total_size
    );

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemFs;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), vec![b'a'; 100]).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/c.bin"), vec![b'c'; 50]).unwrap();
        dir
    }

    #[test]
    fn test_scan_with_filter() {
        let dir = sample_tree();

        let info = scan_tree(dir.path(), &ExtensionFilter::new([".txt"])).unwrap();

        assert_eq!(info.file_count, 1);
        assert_eq!(info.total_size, 100);
        assert_eq!(info.sub_dir_count, 2);
    }

    #[test]
    fn test_scan_without_filter() {
        let dir = sample_tree();

        let info = scan_tree(dir.path(), &ExtensionFilter::default()).unwrap();

        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 150);
    }

    #[test]
    fn test_scan_filter_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("UPPER.TXT"), "12345").unwrap();

        let info = scan_tree(dir.path(), &ExtensionFilter::new(["TXT"])).unwrap();

        assert_eq!(info.file_count, 1);
        assert_eq!(info.total_size, 5);
    }

    #[test]
    fn test_scan_filter_matches_dotfiles() {
        let dir = sample_tree();
        fs::write(dir.path().join(".gitignore"), "target\n").unwrap();
        fs::write(dir.path().join("b/.gitignore"), "*.bin\n").unwrap();

        let info = scan_tree(dir.path(), &ExtensionFilter::new([".gitignore"])).unwrap();

        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 13);
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = TempDir::new().unwrap();

        let info = scan_tree(dir.path(), &ExtensionFilter::default()).unwrap();

        assert_eq!(info.file_count, 0);
        assert_eq!(info.total_size, 0);
        assert_eq!(info.sub_dir_count, 1);
    }

    #[test]
    fn test_scan_missing_root_is_walk_error() {
        let dir = TempDir::new().unwrap();

        let err = scan_tree(&dir.path().join("missing"), &ExtensionFilter::default()).unwrap_err();

        assert!(matches!(err, CopyError::Walk { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_ignores_symlinks() {
        let dir = sample_tree();
        std::os::unix::fs::symlink(dir.path().join("a.txt"), dir.path().join("link.txt")).unwrap();

        let info = scan_tree(dir.path(), &ExtensionFilter::default()).unwrap();

        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 150);
    }

    #[test]
    fn test_scan_memory_tree() {
        let mut mem = MemFs::new();
        mem.insert_file("assets/a.txt", vec![0u8; 10]);
        mem.insert_file("assets/img/logo.png", vec![0u8; 20]);
        mem.insert_dir("assets/empty");

        let info = scan_tree_from(&mem, Path::new("assets"), &ExtensionFilter::default()).unwrap();

        assert_eq!(info.file_count, 2);
        assert_eq!(info.total_size, 30);
        assert_eq!(info.sub_dir_count, 3);
    }
}
