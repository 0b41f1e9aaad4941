use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::db::{Database, PragmaConfig};
use crate::error::{FindexError, Result};
use crate::reconciler::{ReconcileStats, Reconciler, ReconcilerConfig};
use crate::walker::TreeWalker;

/// Progress and completion signals from an indexing pass.
#[derive(Debug)]
pub enum IndexEvent {
    /// A directory was entered; fires once per directory.
    DirStarted(PathBuf),
    /// The pass completed; fires exactly once.
    Finished { elapsed: Duration, files: u64 },
    /// The pass died before completing (store open failure).
    Aborted { error: String },
}

/// Everything a pass needs, owned up front so the worker thread borrows
/// nothing from the caller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub skip_paths: HashSet<PathBuf>,
    pub pragma: PragmaConfig,
    pub reconciler: ReconcilerConfig,
}

impl ControllerConfig {
    pub fn new(root: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            db_path: db_path.into(),
            skip_paths: HashSet::new(),
            pragma: PragmaConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_skip_paths(mut self, skip_paths: HashSet<PathBuf>) -> Self {
        self.skip_paths = skip_paths;
        self
    }
}

/// Orchestrates indexing passes: at most one at a time, progress over a
/// channel, state guarded by an atomic flag rather than by whatever the
/// presentation layer happens to disable.
pub struct IndexController {
    config: ControllerConfig,
    indexing: Arc<AtomicBool>,
}

/// Releases the pass flag when the worker exits, panicking or not.
struct PassGuard(Arc<AtomicBool>);

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IndexController {
    #[must_use]
    pub fn new(config: ControllerConfig) -> Self {
        Self { config, indexing: Arc::new(AtomicBool::new(false)) }
    }

    /// Whether a refresh may be requested right now.
    #[must_use]
    pub fn refresh_available(&self) -> bool {
        !self.indexing.load(Ordering::Acquire)
    }

    /// Start a reconciliation pass on a background worker.
    ///
    /// Returns the event stream for the pass: `DirStarted` per directory,
    /// then exactly one `Finished` or `Aborted`. The channel closes when
    /// the worker exits.
    ///
    /// # Errors
    /// - `FindexError::IndexingInProgress` if a pass is already running.
    /// - `FindexError::RootMissing` / `RootNotDirectory` when the
    ///   configured root is unusable; refusing up front keeps a temporarily
    ///   unreachable root from reading as an empty tree and wiping the
    ///   whole index.
    /// - `FindexError::Io` if the worker thread cannot be spawned.
    pub fn start(&self) -> Result<Receiver<IndexEvent>> {
        let guard = self.try_begin().ok_or(FindexError::IndexingInProgress)?;

        let root = &self.config.root;
        if !root.exists() {
            return Err(FindexError::RootMissing { path: root.display().to_string() });
        }
        if !root.is_dir() {
            return Err(FindexError::RootNotDirectory { path: root.display().to_string() });
        }

        let (tx, rx) = mpsc::channel();
        let config = self.config.clone();

        thread::Builder::new().name("findex-indexer".to_string()).spawn(move || {
            let _guard = guard;
            run_pass(&config, &tx);
        })?;

        Ok(rx)
    }

    /// Claim the single-pass flag; the returned guard releases it on drop.
    fn try_begin(&self) -> Option<PassGuard> {
        self.indexing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(Arc::clone(&self.indexing)))
    }
}

fn run_pass(config: &ControllerConfig, events: &Sender<IndexEvent>) {
    match reconcile_once(config, events) {
        Ok(stats) => {
            tracing::info!(
                files = stats.files_seen,
                inserted = stats.inserted,
                updated = stats.updated,
                deleted = stats.deleted,
                batches_failed = stats.batches_failed,
                elapsed_secs = %format!("{:.2}", stats.elapsed.as_secs_f64()),
                "indexing pass complete"
            );
            let _ = events
                .send(IndexEvent::Finished { elapsed: stats.elapsed, files: stats.files_seen });
        }
        Err(err) => {
            tracing::error!(error = %err, "indexing pass aborted");
            let _ = events.send(IndexEvent::Aborted { error: err.to_string() });
        }
    }
}

fn reconcile_once(
    config: &ControllerConfig,
    events: &Sender<IndexEvent>,
) -> Result<ReconcileStats> {
    let mut db = Database::open(&config.db_path, &config.pragma)?;
    db.init_schema()?;

    let walk = TreeWalker::new(&config.root).with_skip_paths(config.skip_paths.clone());
    Reconciler::new(&mut db, config.reconciler.clone()).run(walk, |dir| {
        // Receiver may have hung up; progress is best-effort.
        let _ = events.send(IndexEvent::DirStarted(dir.to_path_buf()));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DB_NAME;
    use std::fs;
    use tempfile::tempdir;

    fn controller_for(dir: &tempfile::TempDir) -> IndexController {
        IndexController::new(ControllerConfig::new(dir.path(), dir.path().join(DB_NAME)))
    }

    #[test]
    fn test_pass_reports_progress_and_completion() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        fs::write(dir.path().join("sub/b.txt"), "x").unwrap();

        let controller = controller_for(&dir);
        let events: Vec<IndexEvent> = controller.start().unwrap().iter().collect();

        let dirs = events.iter().filter(|e| matches!(e, IndexEvent::DirStarted(_))).count();
        assert_eq!(dirs, 2); // root and sub

        match events.last().unwrap() {
            IndexEvent::Finished { files, .. } => assert_eq!(*files, 2),
            other => panic!("expected Finished, got {other:?}"),
        }
    }

    #[test]
    fn test_refresh_available_toggles() {
        let dir = tempdir().unwrap();
        let controller = controller_for(&dir);

        assert!(controller.refresh_available());
        let guard = controller.try_begin().unwrap();
        assert!(!controller.refresh_available());
        drop(guard);
        assert!(controller.refresh_available());
    }

    #[test]
    fn test_single_pass_at_a_time() {
        let dir = tempdir().unwrap();
        let controller = controller_for(&dir);

        let _held = controller.try_begin().unwrap();
        assert!(controller.try_begin().is_none());

        let result = controller.start();
        assert!(matches!(result, Err(FindexError::IndexingInProgress)));
    }

    #[test]
    fn test_missing_root_rejected() {
        let dir = tempdir().unwrap();
        let config =
            ControllerConfig::new(dir.path().join("not-there"), dir.path().join(DB_NAME));
        let controller = IndexController::new(config);

        let result = controller.start();
        assert!(matches!(result, Err(FindexError::RootMissing { .. })));
        // The rejected start must not leave the flag stuck.
        assert!(controller.refresh_available());
    }

    #[test]
    fn test_root_not_directory_rejected() {
        let dir = tempdir().unwrap();
        let file_root = dir.path().join("plain.txt");
        fs::write(&file_root, "x").unwrap();

        let controller =
            IndexController::new(ControllerConfig::new(file_root, dir.path().join(DB_NAME)));

        assert!(matches!(controller.start(), Err(FindexError::RootNotDirectory { .. })));
        assert!(controller.refresh_available());
    }

    #[test]
    fn test_guard_released_after_completed_pass() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();

        let controller = controller_for(&dir);
        // Drain the first pass to completion.
        for _ in controller.start().unwrap() {}

        assert!(controller.refresh_available());
        let rx = controller.start().unwrap();
        assert!(rx.iter().any(|e| matches!(e, IndexEvent::Finished { .. })));
    }

    #[test]
    fn test_skip_paths_honored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("excluded")).unwrap();
        fs::write(dir.path().join("excluded/secret.txt"), "x").unwrap();
        fs::write(dir.path().join("kept.txt"), "x").unwrap();

        let skip: HashSet<PathBuf> = [dir.path().join("excluded")].into_iter().collect();
        let config = ControllerConfig::new(dir.path(), dir.path().join(DB_NAME))
            .with_skip_paths(skip);
        let controller = IndexController::new(config);

        let files = controller
            .start()
            .unwrap()
            .iter()
            .find_map(|e| match e {
                IndexEvent::Finished { files, .. } => Some(files),
                _ => None,
            })
            .unwrap();
        assert_eq!(files, 1);
    }
}
