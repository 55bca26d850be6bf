//! Source file systems: the host file system and an in-memory tree.
//!
//! Copies always write to the host file system, but may read from any
//! [`SourceFs`]. [`MemFs`] serves bundled assets (for example data pulled in
//! with `include_bytes!`) through the same copy engine.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::CopyError;

/// What kind of entry a path refers to, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Dir,
    /// Symlink, device, socket, FIFO, ...
    Other,
}

/// Metadata of a source entry.
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    /// Entry kind.
    pub kind: EntryKind,
    /// Length in bytes (0 for directories).
    pub len: u64,
    /// Permissions to carry over to the destination, if the source has any.
    pub permissions: Option<fs::Permissions>,
}

/// One entry produced by [`SourceFs::walk`].
#[derive(Debug, Clone)]
pub struct WalkEntry {
    /// Full path of the entry (the walk root joined with its relative path).
    pub path: PathBuf,
    /// Entry kind.
    pub kind: EntryKind,
}

/// Read-only file system a copy can read from.
pub trait SourceFs {
    /// Handle returned by [`SourceFs::open`].
    type File: Read + Seek;

    /// Stat `path` without following symlinks.
    ///
    /// # Errors
    ///
    /// * If the entry does not exist or cannot be read
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Open the file at `path` for reading.
    ///
    /// # Errors
    ///
    /// * If the file cannot be opened
    fn open(&self, path: &Path) -> io::Result<Self::File>;

    /// Visit `root` and everything below it, depth-first, each directory's
    /// children in lexical order, the root first. Stops at the first error,
    /// whether from the traversal or from `visit`.
    ///
    /// # Errors
    ///
    /// * [`CopyError::Walk`] if the traversal fails
    /// * Any error returned by `visit`
    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(WalkEntry) -> Result<(), CopyError>,
    ) -> Result<(), CopyError>;
}

/// The host file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl SourceFs for HostFs {
    type File = fs::File;

    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        let metadata = fs::symlink_metadata(path)?;
        let file_type = metadata.file_type();
        let kind = if file_type.is_file() {
            EntryKind::File
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::Other
        };
        Ok(EntryMetadata {
            kind,
            len: metadata.len(),
            permissions: Some(metadata.permissions()),
        })
    }

    fn open(&self, path: &Path) -> io::Result<Self::File> {
        fs::File::open(path)
    }

    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(WalkEntry) -> Result<(), CopyError>,
    ) -> Result<(), CopyError> {
        for entry in jwalk::WalkDir::new(root)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
        {
            let entry = entry.map_err(|e| CopyError::Walk {
                path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                message: e.to_string(),
            })?;

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };

            visit(WalkEntry {
                path: entry.path(),
                kind,
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum MemNode {
    File(Arc<[u8]>),
    Dir,
}

/// Read-only in-memory file tree.
///
/// Paths are relative (`assets/logo.png`); parent directories are created
/// implicitly when a file is inserted.
#[derive(Debug, Clone, Default)]
pub struct MemFs {
    nodes: BTreeMap<PathBuf, MemNode>,
}

impl MemFs {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub fn insert_file(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.nodes
            .insert(path.to_path_buf(), MemNode::File(contents.into().into()));
    }

    /// Add a directory and its ancestors.
    pub fn insert_dir(&mut self, path: impl AsRef<Path>) {
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.nodes
                .entry(ancestor.to_path_buf())
                .or_insert(MemNode::Dir);
        }
    }

    fn node(&self, path: &Path) -> io::Result<&MemNode> {
        self.nodes.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }
}

impl SourceFs for MemFs {
    type File = Cursor<Arc<[u8]>>;

    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        Ok(match self.node(path)? {
            MemNode::File(data) => EntryMetadata {
                kind: EntryKind::File,
                len: data.len() as u64,
                permissions: None,
            },
            MemNode::Dir => EntryMetadata {
                kind: EntryKind::Dir,
                len: 0,
                permissions: None,
            },
        })
    }

    fn open(&self, path: &Path) -> io::Result<Self::File> {
        match self.node(path)? {
            MemNode::File(data) => Ok(Cursor::new(Arc::clone(data))),
            MemNode::Dir => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            )),
        }
    }

    fn walk(
        &self,
        root: &Path,
        visit: &mut dyn FnMut(WalkEntry) -> Result<(), CopyError>,
    ) -> Result<(), CopyError> {
        self.node(root).map_err(|e| CopyError::Walk {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;

        // Component-wise ordering of the keys is exactly a depth-first,
        // lexically sorted traversal.
        for (path, node) in self.nodes.range(root.to_path_buf()..) {
            if !path.starts_with(root) {
                break;
            }
            let kind = match node {
                MemNode::File(_) => EntryKind::File,
                MemNode::Dir => EntryKind::Dir,
            };
            visit(WalkEntry {
                path: path.clone(),
                kind,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn collect(fs: &impl SourceFs, root: &Path) -> Vec<(PathBuf, EntryKind)> {
        let mut out = Vec::new();
        fs.walk(root, &mut |e| {
            out.push((e.path, e.kind));
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn test_host_walk_is_sorted_depth_first() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/c.bin"), "c").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("d.txt"), "d").unwrap();

        let entries = collect(&HostFs, dir.path());
        let relative: Vec<PathBuf> = entries
            .iter()
            .map(|(p, _)| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::new(),
                PathBuf::from("a.txt"),
                PathBuf::from("b"),
                PathBuf::from("b/c.bin"),
                PathBuf::from("d.txt"),
            ]
        );
        assert_eq!(entries[0].1, EntryKind::Dir);
        assert_eq!(entries[3].1, EntryKind::File);
    }

    #[test]
    fn test_host_walk_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let err = HostFs
            .walk(&dir.path().join("missing"), &mut |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, CopyError::Walk { .. }));
    }

    #[test]
    fn test_host_metadata_does_not_follow_symlinks() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "content").unwrap();
        assert_eq!(HostFs.metadata(&file).unwrap().kind, EntryKind::File);
        assert_eq!(HostFs.metadata(dir.path()).unwrap().kind, EntryKind::Dir);

        #[cfg(unix)]
        {
            let link = dir.path().join("link");
            std::os::unix::fs::symlink(&file, &link).unwrap();
            assert_eq!(HostFs.metadata(&link).unwrap().kind, EntryKind::Other);
        }
    }

    #[test]
    fn test_mem_walk_order_matches_host() {
        let mut mem = MemFs::new();
        mem.insert_file("assets/d.txt", "d");
        mem.insert_file("assets/b/c.bin", "c");
        mem.insert_file("assets/a.txt", "a");
        mem.insert_file("other/x.txt", "x");

        let entries: Vec<PathBuf> = collect(&mem, Path::new("assets"))
            .into_iter()
            .map(|(p, _)| p)
            .collect();

        assert_eq!(
            entries,
            vec![
                PathBuf::from("assets"),
                PathBuf::from("assets/a.txt"),
                PathBuf::from("assets/b"),
                PathBuf::from("assets/b/c.bin"),
                PathBuf::from("assets/d.txt"),
            ]
        );
    }

    #[test]
    fn test_mem_open_and_metadata() {
        let mut mem = MemFs::new();
        mem.insert_file("assets/a.txt", "hello");

        let meta = mem.metadata(Path::new("assets/a.txt")).unwrap();
        assert_eq!(meta.kind, EntryKind::File);
        assert_eq!(meta.len, 5);

        let mut contents = String::new();
        mem.open(Path::new("assets/a.txt"))
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "hello");

        assert!(mem.open(Path::new("assets")).is_err());
        assert!(mem.metadata(Path::new("missing")).is_err());
    }
}
