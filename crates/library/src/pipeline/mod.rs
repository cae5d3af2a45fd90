mod sink;
mod worker;

pub use self::sink::StoreStats;
pub use self::worker::ParseStats;
use crate::error::{ErrorKind, Result};
use crate::registry::Formats;
use crate::walk::{WalkStats, produce};
use bookshelf_catalog::Repository;
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::instrument;

/// Sizing of the ingest pipeline. Every value must be greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Capacity of the queue between the walker and the parse workers.
    pub queue_capacity: usize,
    /// Capacity of the queue between the parse workers and the sink.
    pub book_queue_capacity: usize,
    pub workers: usize,
}
impl Default for IngestOptions {
    fn default() -> Self {
        Self { queue_capacity: 50, book_queue_capacity: 50, workers: 16 }
    }
}
impl IngestOptions {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            exn::bail!(ErrorKind::InvalidOptions("workers"));
        }
        if self.queue_capacity == 0 {
            exn::bail!(ErrorKind::InvalidOptions("queue_capacity"));
        }
        if self.book_queue_capacity == 0 {
            exn::bail!(ErrorKind::InvalidOptions("book_queue_capacity"));
        }
        Ok(())
    }
}

/// Everything that happened during one ingest run, stage by stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub walk: WalkStats,
    pub parse: ParseStats,
    pub store: StoreStats,
}
impl IngestSummary {
    /// Items that were found but never made it into the catalog because of
    /// an error (ignored files are not failures).
    pub fn failures(&self) -> u64 {
        let walk = &self.walk;
        walk.unreadable + walk.broken_archives + walk.traversal_errors + self.parse.failed + self.store.failed
    }
}

/// Ingest every recognized book under `root` into the catalog.
///
/// The walker, `workers` parse workers and the persistence sink run
/// concurrently, connected by two bounded queues. Returns once the last book
/// has been stored.
///
/// Only a bad configuration or an unusable root is an error. Anything going
/// wrong with an individual file, archive entry or book is logged, counted in
/// the returned [`IngestSummary`], and the run carries on.
#[instrument(skip_all, fields(root = %root.as_ref().display()))]
pub async fn ingest(
    root: impl AsRef<Path>,
    options: &IngestOptions,
    formats: Arc<Formats>,
    repository: &Repository,
) -> Result<IngestSummary> {
    let root = root.as_ref();
    options.validate()?;
    check_root(root).await?;

    let (raw_tx, raw_rx) = mpsc::channel(options.queue_capacity);
    let (book_tx, book_rx) = mpsc::channel(options.book_queue_capacity);

    let walker = tokio::spawn(produce(root.to_path_buf(), Arc::clone(&formats), raw_tx));

    let raw_rx = Arc::new(Mutex::new(raw_rx));
    let mut workers = JoinSet::new();
    for id in 0..options.workers {
        workers.spawn(worker::parse_worker(id, Arc::clone(&raw_rx), Arc::clone(&formats), book_tx.clone()));
    }
    // Only the workers may keep the queues open: the raw queue closes for the
    // walker if every worker is gone, the book queue once they have all finished.
    drop(raw_rx);
    drop(book_tx);

    let store = sink::persist(book_rx, repository).await;

    let walk = match walker.await {
        Ok(stats) => stats,
        Err(error) => {
            tracing::error!(%error, "Walker task failed");
            WalkStats::default()
        },
    };
    let mut parse = ParseStats::default();
    while let Some(result) = workers.join_next().await {
        match result {
            Ok(stats) => parse += stats,
            Err(error) => tracing::error!(%error, "Parse worker failed"),
        }
    }

    let summary = IngestSummary { walk, parse, store };
    tracing::info!(
        queued = walk.queued,
        parsed = parse.parsed,
        stored = store.stored,
        failures = summary.failures(),
        "Ingest complete"
    );
    Ok(summary)
}

async fn check_root(root: &Path) -> Result<()> {
    let metadata = tokio::fs::metadata(root).await.or_raise(|| ErrorKind::RootUnavailable(root.to_path_buf()))?;
    if !metadata.is_dir() {
        exn::bail!(ErrorKind::RootUnavailable(root.to_path_buf()));
    }
    tokio::fs::read_dir(root).await.or_raise(|| ErrorKind::RootUnavailable(root.to_path_buf()))?;
    Ok(())
}
