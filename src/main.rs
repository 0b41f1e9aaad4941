use std::path::Path;

use clap::Parser;

use findex::{
    ControllerConfig, Database, FindexError, IndexController, IndexEvent, QueryEngine,
    SearchConfig,
    cli::{Cli, Commands, OutputFormat},
    config::SEARCH_LIMIT,
    error::ExitCode,
    reveal::reveal_in_file_manager,
};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Structured logging to stderr (stdout is reserved for search results).
    // Default: WARN. Override with RUST_LOG=info|debug. --quiet disables.
    if !cli.quiet {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }

    match &cli.command {
        Commands::Index => run_index(&cli),
        Commands::Search { query, format, limit } => {
            run_search(&cli, query, format.unwrap_or_default(), *limit)
        }
        Commands::Reveal { path } => run_reveal(path),
        Commands::Status => run_status(&cli),
    }
}

/// Run one reconciliation pass, streaming progress to the log.
fn run_index(cli: &Cli) -> std::process::ExitCode {
    let config = ControllerConfig::new(cli.root(), cli.db_path()).with_skip_paths(cli.skip_paths());
    let controller = IndexController::new(config);

    let events = match controller.start() {
        Ok(events) => events,
        Err(
            e @ (FindexError::RootMissing { .. } | FindexError::RootNotDirectory { .. }),
        ) => {
            tracing::error!(error = %e, "cannot index");
            return ExitCode::IoErr.into();
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start indexing");
            return ExitCode::Software.into();
        }
    };

    for event in events {
        match event {
            IndexEvent::DirStarted(dir) => {
                tracing::debug!(dir = %dir.display(), "indexing directory");
            }
            IndexEvent::Finished { elapsed, files } => {
                tracing::info!(
                    files,
                    elapsed_secs = %format!("{:.2}", elapsed.as_secs_f64()),
                    "indexing complete"
                );
                return ExitCode::Ok.into();
            }
            IndexEvent::Aborted { error } => {
                tracing::error!(error = %error, "indexing aborted");
                return ExitCode::Software.into();
            }
        }
    }

    // Worker exited without a terminal event; treat as internal error.
    ExitCode::Software.into()
}

fn run_search(
    cli: &Cli,
    query: &[String],
    format: OutputFormat,
    limit: Option<u32>,
) -> std::process::ExitCode {
    let config =
        SearchConfig { max_results: limit.unwrap_or(SEARCH_LIMIT).min(SEARCH_LIMIT), format };
    let engine = QueryEngine::with_config(cli.db_path(), config);

    let hits = engine.search(&query.join(" "));
    if let Err(e) = engine.format_results(&hits, &mut std::io::stdout()) {
        tracing::error!(error = %e, "failed to output search results");
        return ExitCode::Software.into();
    }

    ExitCode::Ok.into()
}

fn run_reveal(path: &Path) -> std::process::ExitCode {
    match reveal_in_file_manager(path) {
        Ok(()) => ExitCode::Ok.into(),
        Err(e @ FindexError::ParentMissing { .. }) => {
            tracing::error!(error = %e, "cannot reveal");
            ExitCode::DataErr.into()
        }
        Err(e) => {
            tracing::error!(error = %e, "reveal failed");
            ExitCode::IoErr.into()
        }
    }
}

fn run_status(cli: &Cli) -> std::process::ExitCode {
    let db_path = cli.db_path();
    let db = match Database::open_readonly(&db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(
                error = %e,
                db_path = %db_path.display(),
                "index not found - run `findex index` first"
            );
            return ExitCode::DataErr.into();
        }
    };

    match db.file_count() {
        Ok(count) => {
            let size = db.size_bytes().unwrap_or(0);
            println!("{count} files indexed ({size} bytes on disk)");
            ExitCode::Ok.into()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to read index");
            ExitCode::Software.into()
        }
    }
}
