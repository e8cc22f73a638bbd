use eyre::{Context, Result};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::filter::IgnoreFilter;

/// One regular file discovered under the upload root. `relative_path` is
/// relative to the root and becomes the remote object name.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub absolute_path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
}

/// Visitor verdict after each file: keep walking or stop cleanly.
/// Stopping is not an error; cancellation uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    Stop,
}

/// Depth-first walk over a directory tree, applying an [`IgnoreFilter`] to
/// base names. An excluded directory prunes its whole subtree; symlinks are
/// not followed. The walk is consumed once per job.
#[derive(Debug, Clone)]
pub struct FileWalker {
    filter: IgnoreFilter,
}

impl FileWalker {
    pub fn new(filter: IgnoreFilter) -> Self {
        Self { filter }
    }

    /// Walk `root` and invoke `visit` for each included regular file, in
    /// directory order. Enumeration errors propagate; a `Stop` verdict ends
    /// the walk without error.
    pub fn walk<F>(&self, root: &Path, mut visit: F) -> Result<()>
    where
        F: FnMut(FileEntry) -> Result<WalkControl>,
    {
        let mut walker = WalkDir::new(root).follow_links(false).into_iter();

        while let Some(next) = walker.next() {
            let entry = next.with_context(|| format!("enumerate {}", root.display()))?;
            let path = entry.path();

            if entry.depth() == 0 {
                continue;
            }

            if entry.file_type().is_dir() {
                if !self.filter.allows_path(path) {
                    walker.skip_current_dir();
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.filter.allows_path(path) {
                continue;
            }

            let metadata = entry
                .metadata()
                .with_context(|| format!("stat file {}", path.display()))?;

            let verdict = visit(FileEntry {
                absolute_path: path.to_path_buf(),
                relative_path: relative_path(root, path),
                size: metadata.len(),
            })?;
            if verdict == WalkControl::Stop {
                break;
            }
        }

        Ok(())
    }

    /// Collect all included files. Used to compute the total byte count
    /// before a worker starts.
    pub fn collect(&self, root: &Path) -> Result<Vec<FileEntry>> {
        let mut entries = Vec::new();
        self.walk(root, |entry| {
            entries.push(entry);
            Ok(WalkControl::Continue)
        })?;
        Ok(entries)
    }
}

fn relative_path(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
        Ok(rel) => rel.to_path_buf(),
        Err(_) => PathBuf::from(path),
    }
}
