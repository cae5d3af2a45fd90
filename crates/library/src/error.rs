//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! An ingest run only ever fails with [`InvalidOptions`](ErrorKind::InvalidOptions)
//! or [`RootUnavailable`](ErrorKind::RootUnavailable). Everything else is
//! confined to a single file, logged and counted in the
//! [`IngestSummary`](crate::IngestSummary).

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid ingest options: `{_0}` must be greater than zero")]
    InvalidOptions(#[error(not(source))] &'static str),
    /// The root directory is missing, not a directory, or cannot be listed.
    #[display("root directory unavailable: {}", _0.display())]
    RootUnavailable(#[error(not(source))] PathBuf),
    /// A directory (or one of its entries) could not be read while walking.
    #[display("unable to read: {}", _0.display())]
    Traversal(#[error(not(source))] PathBuf),
    #[display("no format parser registered for: {_0}")]
    UnknownFormat(#[error(not(source))] String),
    /// The same extension cannot be both a book format and a container.
    #[display("extension {_0} is registered as both a book format and a container")]
    AmbiguousExtension(#[error(not(source))] String),
    #[display("unable to parse document: {}", _0.display())]
    Parse(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
