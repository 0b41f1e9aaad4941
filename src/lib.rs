//! findex - persistent filename index with incremental updates
//!
//! This library maintains a durable `SQLite` index of filenames under a
//! directory tree and answers case-insensitive substring queries against it.
//! Index passes are incremental: the tree is re-walked, each file is
//! classified against the previous snapshot by modification time, and only
//! the differences are written back. Queries keep working while a pass runs.
//!
//! # Example
//!
//! ```rust
//! use findex::{ControllerConfig, IndexController, IndexEvent, QueryEngine, DB_NAME};
//! use std::time::{SystemTime, UNIX_EPOCH};
//!
//! let unique = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos();
//! let root = std::env::temp_dir().join(format!("findex-doctest-{unique}"));
//! std::fs::create_dir_all(&root)?;
//! std::fs::write(root.join("Quarterly-Report.pdf"), b"")?;
//!
//! let db_path = root.join(DB_NAME);
//! let controller = IndexController::new(ControllerConfig::new(root.clone(), db_path.clone()));
//! for event in controller.start()? {
//!     if let IndexEvent::Finished { files, .. } = event {
//!         assert_eq!(files, 1);
//!     }
//! }
//!
//! let engine = QueryEngine::new(db_path);
//! let hits = engine.search("report");
//! assert_eq!(hits.len(), 1);
//!
//! let _ = std::fs::remove_dir_all(&root);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Default database filename, created in the working directory.
pub const DB_NAME: &str = "file_index.db";

/// WAL mode shm file suffix.
pub const DB_SHM_SUFFIX: &str = "-shm";

/// WAL mode wal file suffix.
pub const DB_WAL_SUFFIX: &str = "-wal";

pub mod cli;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod reconciler;
pub mod reveal;
pub mod search;
pub mod walker;

pub use cli::OutputFormat;
pub use controller::{ControllerConfig, IndexController, IndexEvent};
pub use db::{Database, IndexEntry, PragmaConfig, SearchHit};
pub use error::{ExitCode, FindexError, Result};
pub use reconciler::{ReconcileStats, Reconciler, ReconcilerConfig};
pub use search::{QueryEngine, SearchConfig, SearchDispatcher, SearchReply};
pub use walker::{TreeWalker, WalkEvent};
