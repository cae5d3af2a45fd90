use bookshelf_catalog::Repository;
use bookshelf_extract::models::Book;
use tokio::sync::mpsc::Receiver;
use tracing::instrument;

/// Outcome of the persistence sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub stored: u64,
    pub failed: u64,
}

/// Store every book from the queue until all of its senders are gone.
///
/// A book that fails to store is logged and dropped; the repository has
/// already rolled back everything written for it.
#[instrument(skip_all)]
pub(crate) async fn persist(mut books: Receiver<Book>, repository: &Repository) -> StoreStats {
    let mut stats = StoreStats::default();
    while let Some(book) = books.recv().await {
        match repository.store_book(&book).await {
            Ok(id) => {
                tracing::info!(id, title = %book.title(), path = %book.file, "Stored book");
                stats.stored += 1;
            },
            Err(error) => {
                tracing::warn!(
                    title = %book.title(),
                    path = %book.file,
                    error = ?error,
                    "Unable to store book; skipping"
                );
                stats.failed += 1;
            },
        }
    }
    stats
}
