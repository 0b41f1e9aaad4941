use rusqlite::ToSql;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::config::APPLICATION_ID;
use crate::error::{FindexError, Result};

/// One indexed regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Lower-cased base name, the column searches match against.
    pub filename: String,
    /// Absolute path, the entry's identity.
    pub path: String,
    /// Modification time in seconds since the epoch.
    pub mtime: i64,
}

impl IndexEntry {
    /// Build an entry from a path and mtime, deriving the lower-cased
    /// filename column from the path's base name.
    #[must_use]
    pub fn new(path: String, mtime: i64) -> Self {
        let filename = match Path::new(&path).file_name() {
            Some(name) => name.to_string_lossy().to_lowercase(),
            None => path.to_lowercase(),
        };
        Self { filename, path, mtime }
    }
}

/// A search match returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub filename: String,
    pub path: String,
}

/// Database configuration for PRAGMA settings.
#[derive(Debug, Clone)]
pub struct PragmaConfig {
    pub journal_mode: String,
    pub synchronous: String,
    pub cache_size: i64,
    pub temp_store: String,
    pub busy_timeout_ms: i64,
}

impl Default for PragmaConfig {
    fn default() -> Self {
        Self {
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
            cache_size: -32000, // -32000 KB = 32MB, comfortable for million-row indexes
            temp_store: "MEMORY".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

/// Filename index database.
///
/// One row per indexed regular file, keyed by path. WAL mode gives the
/// single-writer/multi-reader concurrency the indexer relies on: the
/// reconciler commits batches on its worker thread while query connections
/// read whatever state was last committed.
pub struct Database {
    conn: rusqlite::Connection,
}

impl Database {
    fn apply_pragma(conn: &rusqlite::Connection, name: &str, value: impl ToSql) -> Result<()> {
        conn.pragma_update(None, name, value)?;
        Ok(())
    }

    /// Open database at path, creating if needed.
    ///
    /// # Errors
    /// Returns `FindexError::ConfigInvalid` for a negative busy timeout and
    /// `FindexError::Database` if the file cannot be opened or a PRAGMA
    /// fails to apply.
    pub fn open(db_path: &Path, config: &PragmaConfig) -> Result<Self> {
        if config.busy_timeout_ms < 0 {
            return Err(FindexError::ConfigInvalid {
                field: "busy_timeout_ms".to_string(),
                value: config.busy_timeout_ms.to_string(),
                reason: "must be >= 0".to_string(),
            });
        }

        let conn = rusqlite::Connection::open(db_path)?;

        Self::apply_pragma(&conn, "journal_mode", &config.journal_mode)?;
        Self::apply_pragma(&conn, "synchronous", &config.synchronous)?;
        Self::apply_pragma(&conn, "cache_size", config.cache_size)?;
        Self::apply_pragma(&conn, "temp_store", &config.temp_store)?;
        Self::apply_pragma(&conn, "trusted_schema", "OFF")?;
        // APPLICATION_ID fits in the positive i32 range, see config tests
        #[allow(clippy::cast_possible_wrap)]
        Self::apply_pragma(&conn, "application_id", APPLICATION_ID as i32)?;

        // Safety: validated non-negative above
        #[allow(clippy::cast_sign_loss)]
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms as u64);
        conn.busy_timeout(busy_timeout)?;

        Ok(Self { conn })
    }

    /// Open database in read-only mode (for the query path).
    ///
    /// # Errors
    /// Returns an error if the database file doesn't exist or can't be opened.
    pub fn open_readonly(db_path: &Path) -> Result<Self> {
        use rusqlite::OpenFlags;

        let conn = rusqlite::Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self { conn })
    }

    /// Initialize schema (idempotent - safe to call multiple times).
    ///
    /// The UNIQUE constraint on `path` doubles as the existence-check index;
    /// `idx_files_filename` serves substring scans.
    ///
    /// # Errors
    /// Returns `FindexError::Database` if a CREATE statement fails.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY,
                path TEXT UNIQUE NOT NULL,
                filename TEXT NOT NULL,
                mtime INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn
            .execute("CREATE INDEX IF NOT EXISTS idx_files_filename ON files(filename)", [])?;

        Ok(())
    }

    /// Load the full path -> mtime mapping for diffing.
    ///
    /// Runs as a single statement, so it observes one committed state and
    /// never a torn batch from a concurrent writer.
    ///
    /// # Errors
    /// Returns `FindexError::Database` if the SELECT fails.
    pub fn snapshot(&self) -> Result<HashMap<String, i64>> {
        let mut stmt = self.conn.prepare("SELECT path, mtime FROM files")?;
        let rows =
            stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut map = HashMap::new();
        for row in rows {
            let (path, mtime) = row?;
            map.insert(path, mtime);
        }
        Ok(map)
    }

    /// Durably apply one batch of changes in a single transaction.
    ///
    /// Upserts insert new paths and refresh the mtime of known ones; the
    /// filename column is derived from the path and never changes on update.
    ///
    /// # Errors
    /// Returns `FindexError::Database` if the transaction fails; no partial
    /// batch is left behind.
    pub fn apply_batch(&mut self, upserts: &[IndexEntry], deletions: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut upsert = tx.prepare_cached(
                "INSERT INTO files (path, filename, mtime) VALUES (?1, ?2, ?3)
                 ON CONFLICT(path) DO UPDATE SET mtime = excluded.mtime",
            )?;
            for entry in upserts {
                upsert.execute(rusqlite::params![entry.path, entry.filename, entry.mtime])?;
            }

            let mut delete = tx.prepare_cached("DELETE FROM files WHERE path = ?1")?;
            for path in deletions {
                delete.execute([path.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Search for files whose filename contains the given substring.
    ///
    /// The needle is expected lower-cased (filenames are stored lower-cased,
    /// which is what makes the containment match case-insensitive). Results
    /// come back in rowid order, i.e. the insertion order of the last pass,
    /// capped at `limit`. No ranking.
    ///
    /// # Errors
    /// Returns `FindexError::Database` if the query fails.
    pub fn search_filename(&self, needle: &str, limit: u32) -> Result<Vec<SearchHit>> {
        let needle = needle.trim();
        if needle.is_empty() {
            return Ok(vec![]);
        }

        let like = escape_like_pattern(needle);

        let mut stmt = self.conn.prepare_cached(
            "SELECT filename, path FROM files
             WHERE filename LIKE '%' || ?1 || '%' ESCAPE '\\'
             LIMIT ?2",
        )?;

        let mut hits = Vec::new();
        let rows = stmt.query_map(rusqlite::params![like, limit], |row| {
            Ok(SearchHit { filename: row.get(0)?, path: row.get(1)? })
        })?;
        for row in rows {
            hits.push(row?);
        }

        Ok(hits)
    }

    /// Get total number of indexed files.
    ///
    /// # Errors
    /// Returns `FindexError::Database` if the COUNT query fails.
    #[must_use = "returns count that should be used"]
    pub fn file_count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        // Safety: row counts fit in usize on all supported platforms
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(count as usize)
    }

    /// Get database file size in bytes (page_count * page_size).
    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        let page_count: i64 =
            self.conn.query_row("PRAGMA page_count", [], |row| row.get(0)).ok()?;
        let page_size: i64 = self.conn.query_row("PRAGMA page_size", [], |row| row.get(0)).ok()?;
        // Safety: both pragmas are non-negative
        #[allow(clippy::cast_sign_loss)]
        Some((page_count * page_size) as u64)
    }

    /// Get database connection (tests use this to force failure modes).
    pub const fn conn(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

/// Escape LIKE wildcard characters in user input.
fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '%' => escaped.push_str("\\%"),
            '_' => escaped.push_str("\\_"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
