//! Directory traversal and the producer side of the raw document queue.

use crate::document::RawDocument;
use crate::error::{ErrorKind, Result};
use crate::path;
use crate::registry::Formats;
use async_stream::stream;
use bookshelf_archive::{Entry, Expansion};
use exn::ResultExt;
use futures::{Stream, StreamExt};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::Arc;
use tokio::fs::{self, DirEntry};
use tokio::sync::mpsc::Sender;
use tracing::instrument;

/// A regular file found under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub path: PathBuf,
    /// Path relative to the root.
    pub relative: PathBuf,
    pub size: u64,
}

enum WalkEntry {
    File(WalkedFile),
    Descend(PathBuf),
    Skip,
}

/// What the walker did with everything it came across.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Documents handed to the parse workers, including archive entries.
    pub queued: u64,
    /// Files and archive entries that could not be read.
    pub unreadable: u64,
    /// Files and archive entries with no registered format.
    pub ignored: u64,
    /// Containers opened successfully.
    pub archives: u64,
    /// Containers that could not be opened at all.
    pub broken_archives: u64,
    /// Directories and directory entries that could not be listed.
    pub traversal_errors: u64,
}

async fn process_entry(root: &Path, entry: DirEntry) -> Result<WalkEntry> {
    let path = entry.path();
    // Not following symlinks: the file type is that of the entry itself.
    let file_type = entry.file_type().await.or_raise(|| ErrorKind::Traversal(path.clone()))?;
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if !file_type.is_file() {
        return Ok(WalkEntry::Skip);
    }
    let metadata = entry.metadata().await.or_raise(|| ErrorKind::Traversal(path.clone()))?;
    let Some(relative) = path::relative_to(root, &path) else {
        return Ok(WalkEntry::Skip);
    };
    Ok(WalkEntry::File(WalkedFile { path, relative, size: metadata.len() }))
}

/// Walk every regular file under `root`, depth first.
///
/// Directories and entries that cannot be read are yielded as
/// [`ErrorKind::Traversal`] errors and the walk carries on with the rest of
/// the tree. Symbolic links, sockets and other special files are skipped.
pub fn walk(root: &Path) -> impl Stream<Item = Result<WalkedFile>> + '_ {
    let mut stack = vec![root.to_path_buf()];
    stream! {
        'dirs: while let Some(current) = stack.pop() {
            let mut entries = match fs::read_dir(&current).await.or_raise(|| ErrorKind::Traversal(current.clone())) {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(e);
                    continue 'dirs;
                },
            };
            'entries: loop {
                let entry = match entries.next_entry().await.or_raise(|| ErrorKind::Traversal(current.clone())) {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break 'entries,
                    Err(e) => {
                        yield Err(e);
                        // A failing directory stream does not recover.
                        break 'entries;
                    },
                };
                match process_entry(root, entry).await {
                    Ok(WalkEntry::File(file)) => yield Ok(file),
                    Ok(WalkEntry::Descend(dir)) => stack.push(dir),
                    Ok(WalkEntry::Skip) => {},
                    Err(e) => yield Err(e),
                }
            }
        }
    }
}

/// Feed the raw document queue from the tree under `root`.
///
/// Book files are read and queued as they are found. Containers are expanded
/// in place, on a blocking thread, and each entry with a registered book
/// format is queued in turn. Either way a full queue makes the walker wait.
///
/// Returns when the walk is done, or early if the queue was closed. Dropping
/// `queue` on return is what tells the workers that no more work is coming.
#[instrument(skip_all, fields(root = %root.display()))]
pub async fn produce(root: PathBuf, formats: Arc<Formats>, queue: Sender<RawDocument>) -> WalkStats {
    let stats = dispatch(&root, walk(&root), &formats, &queue).await;
    tracing::debug!(?stats, "Walk complete");
    stats
}

/// Route every walked file to the book queue, a container expansion or the
/// ignored pile.
async fn dispatch(
    root: &Path,
    files: impl Stream<Item = Result<WalkedFile>>,
    formats: &Arc<Formats>,
    queue: &Sender<RawDocument>,
) -> WalkStats {
    let mut stats = WalkStats::default();
    let mut files = pin!(files);
    while let Some(file) = files.next().await {
        let file = match file {
            Ok(file) => file,
            Err(error) => {
                tracing::warn!(error = ?error, "Unable to traverse; skipping");
                stats.traversal_errors += 1;
                continue;
            },
        };
        let flow = if formats.books().can_process(&file.relative) {
            queue_book(root, file, queue, &mut stats).await
        } else if formats.containers().can_process(&file.relative) {
            expand_container(root, file, formats, queue, &mut stats).await
        } else {
            tracing::debug!(path = %file.path.display(), "Unrecognized format; ignoring");
            stats.ignored += 1;
            ControlFlow::Continue(())
        };
        if flow.is_break() {
            tracing::warn!("Parse queue closed; stopping the walk early");
            break;
        }
    }
    stats
}

async fn queue_book(
    root: &Path,
    file: WalkedFile,
    queue: &Sender<RawDocument>,
    stats: &mut WalkStats,
) -> ControlFlow<()> {
    let data = match fs::read(&file.path).await {
        Ok(data) => data,
        Err(error) => {
            tracing::warn!(path = %file.path.display(), %error, "Unable to read file; skipping");
            stats.unreadable += 1;
            return ControlFlow::Continue(());
        },
    };
    let (directory, filename) = path::split(&file.relative);
    if queue.send(RawDocument::new(root, directory, filename, data)).await.is_err() {
        return ControlFlow::Break(());
    }
    stats.queued += 1;
    ControlFlow::Continue(())
}

async fn expand_container(
    root: &Path,
    file: WalkedFile,
    formats: &Arc<Formats>,
    queue: &Sender<RawDocument>,
    stats: &mut WalkStats,
) -> ControlFlow<()> {
    let Some(expander) = formats.containers().get(&file.relative).cloned() else {
        return ControlFlow::Continue(());
    };
    let formats = Arc::clone(formats);
    let queue = queue.clone();
    let root = root.to_path_buf();
    let (directory, _) = path::split(&file.relative);
    let archive = file.path.clone();
    let format = expander.name();
    let task = tokio::task::spawn_blocking(move || {
        let mut queued = 0u64;
        let select = |name: &str| formats.books().can_process(name);
        let mut visit = |entry: Entry| {
            let document = RawDocument::new(&root, &directory, entry.name, entry.data);
            match queue.blocking_send(document) {
                Ok(()) => {
                    queued += 1;
                    ControlFlow::Continue(())
                },
                Err(_) => ControlFlow::Break(()),
            }
        };
        let result = expander.expand(&archive, &select, &mut visit);
        (result, queued)
    });
    let (result, queued) = match task.await {
        Ok(outcome) => outcome,
        Err(error) => {
            tracing::error!(path = %file.path.display(), %error, "Archive expansion panicked");
            stats.broken_archives += 1;
            return ControlFlow::Continue(());
        },
    };
    stats.queued += queued;
    match result {
        Ok(Expansion { unreadable, ignored, stopped, .. }) => {
            stats.archives += 1;
            stats.unreadable += unreadable;
            stats.ignored += ignored;
            tracing::debug!(path = %file.path.display(), format, queued, ignored, unreadable, "Expanded archive");
            match stopped {
                true => ControlFlow::Break(()),
                false => ControlFlow::Continue(()),
            }
        },
        Err(error) => {
            tracing::warn!(path = %file.path.display(), format, error = ?error, "Unable to open archive; skipping");
            stats.broken_archives += 1;
            ControlFlow::Continue(())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use std::fs as sync_fs;
    use tokio::sync::mpsc;

    fn tree(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, data) in files {
            let path = dir.path().join(name);
            sync_fs::create_dir_all(path.parent().unwrap()).unwrap();
            sync_fs::write(path, data).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_walk_finds_nested_files() {
        let dir = tree(&[("a.fb2", b"a"), ("sf/b.fb2", b"bb"), ("sf/old/c.txt", b"ccc")]);
        sync_fs::create_dir(dir.path().join("empty")).unwrap();
        let mut files: Vec<WalkedFile> = walk(dir.path()).try_collect().await.unwrap();
        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        let relative: Vec<_> = files.iter().map(|f| f.relative.to_str().unwrap()).collect();
        assert_eq!(relative, ["a.fb2", "sf/b.fb2", "sf/old/c.txt"]);
        assert_eq!(files[2].size, 3);
        assert_eq!(files[2].path, dir.path().join("sf/old/c.txt"));
    }

    #[tokio::test]
    async fn test_walk_missing_root_is_a_traversal_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let results: Vec<_> = walk(&missing).collect().await;
        assert_eq!(results.len(), 1);
        let err = results.into_iter().next().unwrap().unwrap_err();
        assert_eq!(*err, ErrorKind::Traversal(missing));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_walk_skips_symlinks() {
        let dir = tree(&[("a.fb2", b"a")]);
        std::os::unix::fs::symlink(dir.path().join("a.fb2"), dir.path().join("link.fb2")).unwrap();
        let files: Vec<WalkedFile> = walk(dir.path()).try_collect().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative, Path::new("a.fb2"));
    }

    #[tokio::test]
    async fn test_walk_continues_past_a_vanished_directory() {
        let dir = tree(&[("a.fb2", b"a"), ("gone/b.fb2", b"b"), ("kept/c.fb2", b"c")]);
        let mut files = pin!(walk(dir.path()));
        // Subdirectories are only listed once the root has been, so the
        // first item is always the top-level file.
        let first = files.next().await.unwrap().unwrap();
        assert_eq!(first.relative, Path::new("a.fb2"));
        sync_fs::remove_dir_all(dir.path().join("gone")).unwrap();

        let rest: Vec<_> = files.collect().await;
        assert_eq!(rest.len(), 2);
        let (found, errors): (Vec<_>, Vec<_>) = rest.into_iter().partition(Result::is_ok);
        assert_eq!(found.into_iter().next().unwrap().unwrap().relative, Path::new("kept/c.fb2"));
        let err = errors.into_iter().next().unwrap().unwrap_err();
        assert_eq!(*err, ErrorKind::Traversal(dir.path().join("gone")));
    }

    #[tokio::test]
    async fn test_queue_book_skips_unreadable_file() {
        let dir = tree(&[("a.fb2", b"a")]);
        let path = dir.path().join("a.fb2");
        sync_fs::remove_file(&path).unwrap();
        let file = WalkedFile { path, relative: PathBuf::from("a.fb2"), size: 1 };
        let (tx, mut rx) = mpsc::channel(1);
        let mut stats = WalkStats::default();

        let flow = queue_book(dir.path(), file, &tx, &mut stats).await;
        assert!(flow.is_continue());
        assert_eq!(stats, WalkStats { unreadable: 1, ..WalkStats::default() });
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dispatch_carries_on_after_errors() {
        let dir = tree(&[("a.fb2", b"a"), ("b.fb2", b"b")]);
        let missing = dir.path().join("sub");
        let items = vec![
            Err::<WalkedFile, _>(std::io::Error::other("listing failed"))
                .or_raise(|| ErrorKind::Traversal(missing.clone())),
            Ok(WalkedFile { path: dir.path().join("gone.fb2"), relative: PathBuf::from("gone.fb2"), size: 1 }),
            Ok(WalkedFile { path: dir.path().join("a.fb2"), relative: PathBuf::from("a.fb2"), size: 1 }),
        ];
        let (tx, mut rx) = mpsc::channel(4);
        let formats = Arc::new(Formats::standard());

        let stats = dispatch(dir.path(), futures::stream::iter(items), &formats, &tx).await;
        assert_eq!(stats, WalkStats { queued: 1, unreadable: 1, traversal_errors: 1, ..WalkStats::default() });
        drop(tx);
        assert_eq!(rx.recv().await.unwrap().filename, "a.fb2");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_produce_queues_books_and_ignores_the_rest() {
        let dir = tree(&[("a.fb2", b"a"), ("sf/b.FB2", b"b"), ("notes.txt", b"ignored")]);
        let (tx, mut rx) = mpsc::channel(8);
        let stats = produce(dir.path().to_path_buf(), Arc::new(Formats::standard()), tx).await;
        assert_eq!(stats, WalkStats { queued: 2, ignored: 1, ..WalkStats::default() });

        let mut documents = Vec::new();
        while let Some(document) = rx.recv().await {
            documents.push(document);
        }
        documents.sort_by(|a, b| a.filename.cmp(&b.filename));
        assert_eq!(documents[0].filename, "a.fb2");
        assert_eq!(documents[0].relative_path, Path::new("."));
        assert_eq!(documents[1].filename, "b.FB2");
        assert_eq!(documents[1].relative_path, Path::new("sf"));
        assert_eq!(documents[1].root, dir.path());
    }

    #[tokio::test]
    async fn test_produce_counts_broken_archives() {
        let dir = tree(&[("broken.zip", b"not a zip"), ("a.fb2", b"a")]);
        let (tx, mut rx) = mpsc::channel(8);
        let stats = produce(dir.path().to_path_buf(), Arc::new(Formats::standard()), tx).await;
        assert_eq!(stats.broken_archives, 1);
        assert_eq!(stats.queued, 1);
        assert_eq!(rx.recv().await.unwrap().filename, "a.fb2");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_produce_stops_when_queue_is_closed() {
        let dir = tree(&[("a.fb2", b"a"), ("b.fb2", b"b"), ("c.fb2", b"c")]);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let stats = produce(dir.path().to_path_buf(), Arc::new(Formats::standard()), tx).await;
        assert_eq!(stats.queued, 0);
    }
}
