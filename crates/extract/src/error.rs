//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The XML is too broken to process.
    #[display("malformed XML at byte {_0}")]
    MalformedXml(#[error(not(source))] u64),
    /// The document is well-formed, but not a FictionBook.
    #[display("invalid document: expected a <FictionBook> root element")]
    InvalidDocument,
    /// The document ended before the metadata was complete.
    #[display("unexpected end of document")]
    Truncated,
    /// Text content could not be decoded or unescaped.
    #[display("failed to decode text of <{_0}>")]
    Encoding(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The document is either valid or it isn't, nothing in here
        // touches I/O.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::MalformedXml(42).to_string(), "malformed XML at byte 42");
        assert_eq!(ErrorKind::Encoding("book-title".to_string()).to_string(), "failed to decode text of <book-title>");
        assert!(!ErrorKind::Truncated.is_retryable());
    }
}
