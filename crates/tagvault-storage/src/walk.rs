//! Recursive directory walk.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// What a walked entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A directory, including the walk root.
    Directory,
    /// A regular file.
    File,
}

/// One entry found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Directory or file.
    pub kind: EntryKind,
    /// Physical path.
    pub path: PathBuf,
    /// Size in bytes (zero for directories).
    pub size: u64,
}

/// Result of walking a tree.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Entries in depth-first order.
    pub entries: Vec<WalkEntry>,
    /// Branches whose contents could not be listed.
    pub unreadable: Vec<PathBuf>,
}

impl WalkOutcome {
    /// Directories only.
    pub fn directories(&self) -> impl Iterator<Item = &WalkEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::Directory)
    }

    /// Regular files only.
    pub fn files(&self) -> impl Iterator<Item = &WalkEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::File)
    }

    /// Whether `path` lies strictly beneath a branch the walk could not read.
    pub fn is_beneath_unreadable(&self, path: &Path) -> bool {
        self.unreadable
            .iter()
            .any(|branch| path != branch && path.starts_with(branch))
    }
}

/// Walk `root` depth first without following symlinks.
///
/// Symlinks and special files are skipped. A directory that cannot be
/// listed is recorded in [`WalkOutcome::unreadable`] and the walk goes on.
pub fn walk_tree(root: &Path) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();

    for entry in WalkDir::new(root).follow_links(false) {
        match entry {
            Ok(entry) => {
                let file_type = entry.file_type();
                if file_type.is_dir() {
                    outcome.entries.push(WalkEntry {
                        kind: EntryKind::Directory,
                        path: entry.into_path(),
                        size: 0,
                    });
                } else if file_type.is_file() {
                    let size = match entry.metadata() {
                        Ok(meta) => meta.len(),
                        Err(e) => {
                            warn!(
                                path = %entry.path().display(),
                                error = %e,
                                "Failed to stat file"
                            );
                            continue;
                        }
                    };
                    outcome.entries.push(WalkEntry {
                        kind: EntryKind::File,
                        path: entry.into_path(),
                        size,
                    });
                } else {
                    debug!(path = %entry.path().display(), "Skipping non-regular entry");
                }
            }
            Err(e) => {
                let branch = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                warn!(path = %branch.display(), error = %e, "Skipping unreadable branch");
                outcome.unreadable.push(branch);
            }
        }
    }

    outcome
}
