//! `bookshelf`: scan a directory tree for ebooks and catalog their metadata.

mod cli;
mod error;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use bookshelf_catalog::{Database, Repository};
use bookshelf_config::Config;
use bookshelf_library::{Formats, IngestOptions, IngestSummary, ingest};
use clap::Parser;
use exn::ResultExt;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse before installing the subscriber so that --help stays clean.
    let args = Args::parse();
    // RUST_LOG > --quiet > --verbose > info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::debug!(?args, "CLI arguments parsed");

    match run(&args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = ?error, "Aborted");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: &Args) -> Result<IngestSummary> {
    let mut config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    args.apply(&mut config);
    config.validate().or_raise(|| ErrorKind::Config)?;
    tracing::debug!(?config, "Configuration loaded");

    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
    }
    let db = Database::connect(path).await.or_raise(|| ErrorKind::Database)?;
    let repository = Repository::from(&db);

    let options = IngestOptions {
        queue_capacity: config.ingest.queue_capacity,
        book_queue_capacity: config.ingest.book_queue_capacity,
        workers: config.ingest.workers,
    };
    tracing::info!(root = %config.ingest.root.display(), database = %path.display(), "Ingest starting");
    let result = ingest(&config.ingest.root, &options, Arc::new(Formats::standard()), &repository).await;
    if result.is_ok()
        && let Ok(counts) = repository.counts().await
    {
        tracing::debug!(?counts, "Catalog totals");
    }
    db.close().await;
    let summary = result.or_raise(|| ErrorKind::Ingest)?;

    let walk = &summary.walk;
    tracing::info!(
        stored = summary.store.stored,
        archives = walk.archives,
        ignored = walk.ignored,
        unreadable = walk.unreadable,
        broken_archives = walk.broken_archives,
        traversal_errors = walk.traversal_errors,
        parse_failures = summary.parse.failed,
        store_failures = summary.store.failed,
        "Summary"
    );
    Ok(summary)
}
