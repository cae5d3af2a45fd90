//! Binary Error Types
//!
//! Every error that reaches `main` aborts the run.

use derive_more::{Display, Error};

/// A fatal error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for the binary.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("unable to load configuration")]
    Config,
    #[display("unable to open the catalog database")]
    Database,
    #[display("unable to start the ingest run")]
    Ingest,
}
