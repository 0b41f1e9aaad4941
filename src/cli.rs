use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::DB_NAME;
use crate::config;

/// Output format for search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// CLI arguments for the filename indexer.
#[derive(Parser, Debug)]
#[command(
    name = "findex",
    version = env!("CARGO_PKG_VERSION"),
    about = "Persistent filename index with incremental updates and substring search",
    long_about = "Persistent filename index with incremental updates and substring search

Walks a directory tree, keeps a durable SQLite index of every filename,
and answers case-insensitive substring queries against it. Re-running
`index` reconciles the store against the live tree: new and modified
files are upserted, vanished files are removed.

SUBCOMMANDS:
  index      Run one reconciliation pass over the root
  search     Search indexed filenames for a substring
  reveal     Open the folder containing an indexed file
  status     Print index statistics"
)]
pub struct Cli {
    /// Directory tree to index (defaults to the volume root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Index database location (defaults to file_index.db in the working directory)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Directory to exclude from walks, exact path match (repeatable)
    #[arg(long = "skip")]
    pub skip: Vec<PathBuf>,

    /// Suppress all log output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one reconciliation pass over the root
    Index,

    /// Search indexed filenames for a substring
    Search {
        /// Search query; joined with spaces when given as multiple words
        query: Vec<String>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Maximum results to print
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Open the folder containing an indexed file
    Reveal {
        /// File whose containing folder should be shown
        path: PathBuf,
    },

    /// Print index statistics
    Status,
}

impl Cli {
    /// Resolved traversal root.
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(config::default_root)
    }

    /// Resolved database path.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(|| PathBuf::from(DB_NAME))
    }

    /// Platform skip list plus any `--skip` additions.
    #[must_use]
    pub fn skip_paths(&self) -> HashSet<PathBuf> {
        config::default_skip_paths().into_iter().chain(self.skip.iter().cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        let cli = Cli::parse_from(["findex", "--root", "/data", "index"]);
        assert_eq!(cli.root(), PathBuf::from("/data"));
        assert!(matches!(cli.command, Commands::Index));
    }

    #[test]
    fn test_parse_search_with_format() {
        let cli = Cli::parse_from(["findex", "search", "--format", "json", "report"]);
        match cli.command {
            Commands::Search { query, format, .. } => {
                assert_eq!(query, vec!["report".to_string()]);
                assert_eq!(format, Some(OutputFormat::Json));
            }
            _ => panic!("expected search subcommand"),
        }
    }

    #[test]
    fn test_default_db_path() {
        let cli = Cli::parse_from(["findex", "status"]);
        assert_eq!(cli.db_path(), PathBuf::from(DB_NAME));
    }

    #[test]
    fn test_skip_paths_extend_defaults() {
        let cli = Cli::parse_from(["findex", "--skip", "/data/tmp", "index"]);
        let skip = cli.skip_paths();
        assert!(skip.contains(&PathBuf::from("/data/tmp")));
        for default in config::default_skip_paths() {
            assert!(skip.contains(&default));
        }
    }
}
