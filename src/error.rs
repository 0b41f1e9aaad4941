use thiserror::Error;

/// Centralized error types for the filename indexer.
///
/// All errors are explicit enum variants (no Box<dyn Error>) for
/// actionable error messages at every call site.
#[derive(Error, Debug)]
pub enum FindexError {
    /// `SQLite` database operation failed
    #[error("database error: {source}")]
    Database {
        #[from]
        source: rusqlite::Error,
    },

    /// File system I/O operation failed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Traversal root does not exist
    #[error("root '{path}' does not exist")]
    RootMissing { path: String },

    /// Traversal root is not a directory
    #[error("root '{path}' is not a directory")]
    RootNotDirectory { path: String },

    /// A reconciliation pass is already running
    #[error("an indexing pass is already in progress")]
    IndexingInProgress,

    /// Invalid configuration value
    #[error("invalid {field}: {value} ({reason})")]
    ConfigInvalid { field: String, value: String, reason: String },

    /// Containing folder of a revealed file no longer exists
    #[error("folder '{path}' no longer exists")]
    ParentMissing { path: String },

    /// Platform file manager refused the reveal request
    #[error("file manager command '{command}' failed")]
    RevealFailed { command: String },

    /// JSON serialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Result type alias for indexer operations.
pub type Result<T> = std::result::Result<T, FindexError>;

/// Exit codes for the CLI application.
///
/// Based on BSD sysexits.h conventions for meaningful exit statuses.
/// Use `ExitCode::into()` to convert to `std::process::ExitCode`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Successful execution
    Ok = 0,
    /// General software error (internal error, unexpected state)
    Software = 1,
    /// Invalid input data (missing index, nonexistent file)
    DataErr = 2,
    /// I/O error (root not found, permission denied)
    IoErr = 3,
    /// No input provided (missing required arguments)
    NoInput = 4,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Ok as u8, 0);
        assert_eq!(ExitCode::Software as u8, 1);
        assert_eq!(ExitCode::DataErr as u8, 2);
        assert_eq!(ExitCode::IoErr as u8, 3);
        assert_eq!(ExitCode::NoInput as u8, 4);
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: FindexError = io_error.into();
        match error {
            FindexError::Io { .. } => {}
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_root_missing_display() {
        let error = FindexError::RootMissing { path: "/mnt/gone".to_string() };
        let display = format!("{error}");
        assert!(display.contains("/mnt/gone"));
        assert!(display.contains("does not exist"));
    }

    #[test]
    fn test_parent_missing_display() {
        let error = FindexError::ParentMissing { path: "/tmp/removed".to_string() };
        assert!(format!("{error}").contains("no longer exists"));
    }
}
