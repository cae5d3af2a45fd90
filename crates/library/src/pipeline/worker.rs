use crate::document::RawDocument;
use crate::registry::Formats;
use bookshelf_extract::models::Book;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::instrument;

/// Outcome of the parse workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub parsed: u64,
    pub failed: u64,
}
impl std::ops::AddAssign for ParseStats {
    fn add_assign(&mut self, other: Self) {
        self.parsed += other.parsed;
        self.failed += other.failed;
    }
}

/// Take documents off the shared queue until it is closed and drained,
/// parsing each one and passing the result on to the book queue.
///
/// A document that fails to parse is logged and dropped. Returns early if
/// the book queue has been closed.
#[instrument(skip(queue, formats, books))]
pub(crate) async fn parse_worker(
    id: usize,
    queue: Arc<Mutex<Receiver<RawDocument>>>,
    formats: Arc<Formats>,
    books: Sender<Book>,
) -> ParseStats {
    let mut stats = ParseStats::default();
    loop {
        // Only one idle worker waits on the channel at a time; the others
        // wait for the lock.
        let next = queue.lock().await.recv().await;
        let Some(document) = next else {
            break;
        };
        let path = document.full_path();
        let format = formats.books().get(document.extension_source()).map_or("unknown", |parser| parser.name());
        let formats = Arc::clone(&formats);
        let book = match tokio::task::spawn_blocking(move || formats.parse(document)).await {
            Ok(Ok(book)) => book,
            Ok(Err(error)) => {
                tracing::warn!(path = %path.display(), format, error = ?error, "Unable to parse document; skipping");
                stats.failed += 1;
                continue;
            },
            Err(error) => {
                tracing::error!(path = %path.display(), format, %error, "Parser panicked; skipping");
                stats.failed += 1;
                continue;
            },
        };
        if books.send(book).await.is_err() {
            tracing::warn!("Book queue closed; stopping worker");
            break;
        }
        stats.parsed += 1;
    }
    tracing::debug!(?stats, "Worker finished");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const FB2: &[u8] =
        b"<FictionBook><description><title-info><book-title>X</book-title></title-info></description></FictionBook>";

    #[tokio::test]
    async fn test_worker_parses_until_queue_closes() {
        let (raw_tx, raw_rx) = mpsc::channel(4);
        let (book_tx, mut book_rx) = mpsc::channel(4);
        raw_tx.send(RawDocument::new("/books", ".", "a.fb2", FB2.to_vec())).await.unwrap();
        raw_tx.send(RawDocument::new("/books", ".", "b.fb2", b"garbage".to_vec())).await.unwrap();
        drop(raw_tx);

        let stats = parse_worker(0, Arc::new(Mutex::new(raw_rx)), Arc::new(Formats::standard()), book_tx).await;
        assert_eq!(stats, ParseStats { parsed: 1, failed: 1 });
        assert_eq!(book_rx.recv().await.unwrap().title(), "X");
        // The worker's sender was its only one: the book queue is closed.
        assert!(book_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_worker_stops_when_book_queue_closes() {
        let (raw_tx, raw_rx) = mpsc::channel(4);
        let (book_tx, book_rx) = mpsc::channel(1);
        drop(book_rx);
        raw_tx.send(RawDocument::new("/books", ".", "a.fb2", FB2.to_vec())).await.unwrap();
        let stats = parse_worker(0, Arc::new(Mutex::new(raw_rx)), Arc::new(Formats::standard()), book_tx).await;
        assert_eq!(stats, ParseStats::default());
    }
}
