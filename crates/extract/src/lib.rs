//! Ebook models and metadata extraction.
//!
//! The [`models`] describe a book the way the catalog stores it: bibliographic
//! [`Metadata`](models::Metadata) plus the [`FileProvenance`](models::FileProvenance)
//! of the document it was read from. Formats plug in by implementing
//! [`FormatParser`]; FictionBook 2 ships with the crate as [`Fb2Parser`].

pub mod error;
mod fb2;
pub mod models;
mod parser;

pub use crate::fb2::{Fb2Parser, parse_fb2};
pub use crate::parser::FormatParser;
