//! Concurrent ingestion of ebook directory trees.
//!
//! An ingest run is a three-stage pipeline:
//!
//! ```text
//! walker ──[raw documents]──▶ N parse workers ──[books]──▶ sink ──▶ catalog
//! ```
//!
//! 1. The [walker](walk::produce) traverses the root directory, reads every
//!    file with a registered book format and expands every registered
//!    container, queueing one [`RawDocument`] per document.
//! 2. Parse workers dispatch each document to the [`FormatParser`](bookshelf_extract::FormatParser)
//!    registered for its extension.
//! 3. A single sink writes each parsed book to the catalog.
//!
//! Both queues are bounded, so a slow stage makes the ones before it wait
//! instead of buffering without limit. Each stage finishes when its input
//! queue is closed and drained, and closes its output queue by dropping the
//! sending side.

pub mod error;
pub mod path;
mod document;
mod pipeline;
mod registry;
pub mod walk;

pub use crate::document::RawDocument;
pub use crate::pipeline::{IngestOptions, IngestSummary, ParseStats, StoreStats, ingest};
pub use crate::registry::{Formats, Registry};
pub use crate::walk::WalkStats;
