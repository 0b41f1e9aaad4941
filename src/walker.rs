use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::{DirEntry, WalkDir};

/// One observation from a directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A directory was entered; emitted before any of its files.
    Directory(PathBuf),
    /// A regular file and its modification time in epoch seconds.
    File { path: PathBuf, mtime: i64 },
}

/// Recursive traversal of a root directory.
///
/// Yields every reachable regular file exactly once, preceded by a
/// `Directory` event for each directory entered. Directories whose exact
/// path appears in the skip set are not descended into. Entries that
/// cannot be read (permission denied, broken symlink, vanished file) are
/// logged and skipped; a walk never aborts over one bad entry. Symlinks
/// are not followed.
pub struct TreeWalker {
    it: walkdir::IntoIter,
    skip: HashSet<PathBuf>,
}

impl TreeWalker {
    /// Create a walker rooted at `root` with an empty skip set.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self { it: WalkDir::new(root).follow_links(false).into_iter(), skip: HashSet::new() }
    }

    /// Replace the set of directories excluded from descent.
    #[must_use]
    pub fn with_skip_paths(mut self, skip: HashSet<PathBuf>) -> Self {
        self.skip = skip;
        self
    }
}

impl Iterator for TreeWalker {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<WalkEvent> {
        loop {
            let entry = match self.it.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            let file_type = entry.file_type();

            if file_type.is_dir() {
                if self.skip.contains(entry.path()) {
                    self.it.skip_current_dir();
                    continue;
                }
                return Some(WalkEvent::Directory(entry.into_path()));
            }

            // Symlinks, sockets, fifos: only regular files are indexed.
            if !file_type.is_file() {
                continue;
            }

            match file_mtime(&entry) {
                Ok(mtime) => return Some(WalkEvent::File { path: entry.into_path(), mtime }),
                Err(err) => {
                    tracing::debug!(
                        path = %entry.path().display(),
                        error = %err,
                        "skipping file without readable mtime"
                    );
                }
            }
        }
    }
}

fn file_mtime(entry: &DirEntry) -> io::Result<i64> {
    let modified = entry.metadata().map_err(io::Error::from)?.modified()?;
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map_err(|e| io::Error::other(format!("mtime before epoch: {e}")))?
        .as_secs();
    i64::try_from(secs).map_err(|_| io::Error::other(format!("mtime out of range: {secs}")))
}
