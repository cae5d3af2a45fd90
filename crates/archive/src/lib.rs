//! Expansion of container files (archives) into the documents they hold.
//!
//! A container is opened as a random-access archive and its entries are
//! visited sequentially, in archive order. Only entries accepted by the
//! caller's selector are read, and each one is read fully into memory before
//! it is handed over:
//!
//! - A container that cannot be opened is an [`ErrorKind::Open`](error::ErrorKind::Open)
//!   error and yields nothing.
//! - An entry that cannot be read is logged and skipped; its siblings are
//!   still visited.

pub mod error;
mod zipped;

pub use crate::zipped::ZipExpander;
use crate::error::Result;
use std::ops::ControlFlow;
use std::path::Path;

/// One document read out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Full name of the entry inside the archive (may contain `/`).
    pub name: String,
    pub data: Vec<u8>,
}

/// What happened to the entries of one archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Entries read and handed to the visitor.
    pub extracted: u64,
    /// Selected entries that could not be opened or read.
    pub unreadable: u64,
    /// Directories and entries rejected by the selector.
    pub ignored: u64,
    /// The visitor asked to stop before the last entry.
    pub stopped: bool,
}

/// Expands a container file into its entries.
///
/// Implementations are registered per file extension and shared between
/// threads. Expansion is synchronous, blocking I/O.
pub trait ArchiveExpander: Send + Sync {
    /// Human-readable name of the container format, used for logging.
    fn name(&self) -> &'static str;

    /// Visit every entry of the archive at `path` whose name `select` accepts.
    ///
    /// `visit` receives each entry as soon as it has been read, and may return
    /// [`ControlFlow::Break`] to stop the expansion early.
    fn expand(
        &self,
        path: &Path,
        select: &dyn Fn(&str) -> bool,
        visit: &mut dyn FnMut(Entry) -> ControlFlow<()>,
    ) -> Result<Expansion>;
}
