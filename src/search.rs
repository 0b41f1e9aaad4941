use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use crate::config::SEARCH_LIMIT;
use crate::db::{Database, SearchHit};
use crate::error::Result;

pub use crate::cli::OutputFormat;

/// Configuration for search operations.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum results to return (capped at the store-wide limit).
    pub max_results: u32,
    /// Output format
    pub format: OutputFormat,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { max_results: SEARCH_LIMIT, format: OutputFormat::Plain }
    }
}

/// Search hit for JSON output.
#[derive(Debug, Serialize)]
pub struct JsonSearchHit {
    pub filename: String,
    pub path: String,
}

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub results: Vec<JsonSearchHit>,
}

/// Substring search over indexed filenames.
///
/// Each query opens its own short-lived read connection, so searches can
/// be issued from any thread at any time, including while a
/// reconciliation pass is writing. A reader mid-pass sees whatever
/// batches have committed so far; that partial view is documented
/// behavior, not a defect.
pub struct QueryEngine {
    db_path: PathBuf,
    config: SearchConfig,
}

impl QueryEngine {
    /// Create an engine with default configuration.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self::with_config(db_path, SearchConfig::default())
    }

    pub fn with_config(db_path: impl Into<PathBuf>, config: SearchConfig) -> Self {
        Self { db_path: db_path.into(), config }
    }

    /// Execute a query.
    ///
    /// Empty or whitespace-only input returns an empty result without
    /// touching the store. Storage failures (missing index file, locked
    /// database) are logged and mapped to an empty result so the
    /// interactive path never sees an error.
    #[must_use]
    pub fn search(&self, raw_query: &str) -> Vec<SearchHit> {
        let trimmed = raw_query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let needle = trimmed.to_lowercase();
        match self.run(&needle) {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(query = %trimmed, error = %err, "search failed");
                Vec::new()
            }
        }
    }

    fn run(&self, needle: &str) -> Result<Vec<SearchHit>> {
        let db = Database::open_readonly(&self.db_path)?;
        db.search_filename(needle, self.config.max_results.min(SEARCH_LIMIT))
    }

    /// Format and output search results.
    ///
    /// # Errors
    /// Returns `FindexError::Io` if writing fails or `FindexError::Json`
    /// when JSON serialization fails.
    pub fn format_results<W: Write>(&self, hits: &[SearchHit], output: &mut W) -> Result<()> {
        match self.config.format {
            OutputFormat::Plain => format_plain(hits, output),
            OutputFormat::Json => format_json(hits, output),
        }
    }
}

/// Plain text: filename and path, tab-separated, one hit per line.
fn format_plain<W: Write>(hits: &[SearchHit], output: &mut W) -> Result<()> {
    for hit in hits {
        writeln!(output, "{}\t{}", hit.filename, hit.path)?;
    }
    Ok(())
}

fn format_json<W: Write>(hits: &[SearchHit], output: &mut W) -> Result<()> {
    let results: Vec<JsonSearchHit> = hits
        .iter()
        .map(|h| JsonSearchHit { filename: h.filename.clone(), path: h.path.clone() })
        .collect();

    let json = serde_json::to_string_pretty(&JsonOutput { results })?;
    writeln!(output, "{json}")?;
    Ok(())
}

/// A completed query and its results.
#[derive(Debug)]
pub struct SearchReply {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

/// Fire-and-forget query dispatch with stale-result suppression.
///
/// Every dispatch runs on its own thread so a slow scan never blocks the
/// next keystroke-driven query. Each dispatch takes a generation ticket;
/// a reply is delivered only if its ticket is still the newest, so an
/// early slow query can never overwrite the results of a later one.
pub struct SearchDispatcher {
    engine: Arc<QueryEngine>,
    generation: Arc<AtomicU64>,
}

impl SearchDispatcher {
    #[must_use]
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine: Arc::new(engine), generation: Arc::new(AtomicU64::new(0)) }
    }

    /// Run `query` on a worker thread; the reply is sent over `reply_tx`
    /// unless a newer dispatch superseded it first.
    pub fn dispatch(&self, query: String, reply_tx: Sender<SearchReply>) {
        let ticket = self.begin();
        let engine = Arc::clone(&self.engine);
        let generation = Arc::clone(&self.generation);

        thread::spawn(move || {
            let hits = engine.search(&query);
            if generation.load(Ordering::Acquire) == ticket {
                let _ = reply_tx.send(SearchReply { query, hits });
            }
        });
    }

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}
