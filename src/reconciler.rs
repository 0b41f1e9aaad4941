//! Incremental diff between the store's snapshot and a live walk.
//!
//! Each walked file is classified NEW (not in the snapshot), MODIFIED
//! (snapshot mtime differs) or UNCHANGED (no write). Upserts are flushed
//! in chunks so a large pass neither holds every row in memory nor starves
//! concurrent readers behind one giant transaction. Deletions can only be
//! computed once the walk has finished - a path's absence is provable only
//! against the complete live set - so the snapshot keys and the live path
//! set are both held in memory for the duration of a pass.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::BATCH_SIZE;
use crate::db::{Database, IndexEntry};
use crate::error::Result;
use crate::walker::WalkEvent;
use crate::{DB_NAME, DB_SHM_SUFFIX, DB_WAL_SUFFIX};

/// Configuration for a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Upserts accumulated before a chunk is committed.
    pub batch_size: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { batch_size: BATCH_SIZE }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileStats {
    /// Regular files observed by the walk (the live set size).
    pub files_seen: u64,
    /// Files classified new.
    pub inserted: u64,
    /// Files whose stored mtime was stale.
    pub updated: u64,
    /// Snapshot paths absent from the live walk.
    pub deleted: u64,
    /// Batches dropped after a storage write failure.
    pub batches_failed: u64,
    pub elapsed: Duration,
}

/// The incremental indexing engine.
pub struct Reconciler<'a> {
    db: &'a mut Database,
    config: ReconcilerConfig,
}

impl<'a> Reconciler<'a> {
    pub fn new(db: &'a mut Database, config: ReconcilerConfig) -> Self {
        Self { db, config }
    }

    /// Run one full pass over `events`, invoking `on_dir` for every
    /// directory entered.
    ///
    /// A failed batch write is logged and dropped; the pass continues and
    /// the drop is surfaced in [`ReconcileStats::batches_failed`].
    ///
    /// # Errors
    /// Returns `FindexError::Database` only if the initial snapshot load
    /// fails - without it there is nothing to diff against.
    pub fn run<I, F>(&mut self, events: I, mut on_dir: F) -> Result<ReconcileStats>
    where
        I: IntoIterator<Item = WalkEvent>,
        F: FnMut(&Path),
    {
        let started = Instant::now();
        let snapshot = self.db.snapshot()?;

        let mut live: HashSet<String> = HashSet::with_capacity(snapshot.len());
        let mut pending: Vec<IndexEntry> = Vec::with_capacity(self.config.batch_size);
        let mut stats = ReconcileStats::default();

        for event in events {
            match event {
                WalkEvent::Directory(dir) => on_dir(&dir),
                WalkEvent::File { path, mtime } => {
                    if is_store_artifact(&path) {
                        continue;
                    }
                    let path = path.to_string_lossy().into_owned();
                    stats.files_seen += 1;

                    match snapshot.get(&path) {
                        Some(&prev) if prev == mtime => {}
                        Some(_) => {
                            stats.updated += 1;
                            pending.push(IndexEntry::new(path.clone(), mtime));
                        }
                        None => {
                            stats.inserted += 1;
                            pending.push(IndexEntry::new(path.clone(), mtime));
                        }
                    }
                    live.insert(path);

                    if pending.len() >= self.config.batch_size {
                        self.flush(&mut pending, &mut stats);
                    }
                }
            }
        }
        self.flush(&mut pending, &mut stats);

        // Deletions as a post-walk set difference, applied in one batch.
        let deletions: Vec<String> =
            snapshot.keys().filter(|path| !live.contains(*path)).cloned().collect();
        if !deletions.is_empty() {
            match self.db.apply_batch(&[], &deletions) {
                Ok(()) => stats.deleted = deletions.len() as u64,
                Err(err) => {
                    stats.batches_failed += 1;
                    tracing::warn!(
                        rows = deletions.len(),
                        error = %err,
                        "dropping failed deletion batch"
                    );
                }
            }
        }

        stats.elapsed = started.elapsed();
        Ok(stats)
    }

    fn flush(&mut self, pending: &mut Vec<IndexEntry>, stats: &mut ReconcileStats) {
        if pending.is_empty() {
            return;
        }
        if let Err(err) = self.db.apply_batch(pending, &[]) {
            stats.batches_failed += 1;
            tracing::warn!(rows = pending.len(), error = %err, "dropping failed upsert batch");
        }
        pending.clear();
    }
}

/// The index's own database files must never index themselves.
fn is_store_artifact(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name == DB_NAME
        || (name.starts_with(DB_NAME)
            && (name.ends_with(DB_SHM_SUFFIX) || name.ends_with(DB_WAL_SUFFIX)))
}
