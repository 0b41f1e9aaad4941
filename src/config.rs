use std::path::PathBuf;

/// Rows accumulated before a reconciliation batch is committed.
pub const BATCH_SIZE: usize = 1000;

/// Maximum rows a single search may return.
pub const SEARCH_LIMIT: u32 = 1000;

/// SQLite application_id stamped into findex databases ("FIDX").
pub const APPLICATION_ID: u32 = 0x4649_4458;

/// Default traversal root: the primary volume root.
#[cfg(windows)]
#[must_use]
pub fn default_root() -> PathBuf {
    PathBuf::from("C:\\")
}

/// Default traversal root: the filesystem root.
#[cfg(not(windows))]
#[must_use]
pub fn default_root() -> PathBuf {
    PathBuf::from("/")
}

/// Directories never descended into (exact path match).
#[cfg(windows)]
#[must_use]
pub fn default_skip_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("C:\\$Recycle.Bin"),
        PathBuf::from("C:\\System Volume Information"),
    ]
}

/// Directories never descended into (exact path match).
///
/// The virtual filesystems hold no regular files worth indexing and
/// /proc in particular produces endless permission noise.
#[cfg(not(windows))]
#[must_use]
pub fn default_skip_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/proc"),
        PathBuf::from("/sys"),
        PathBuf::from("/dev"),
        PathBuf::from("/run"),
    ]
}
