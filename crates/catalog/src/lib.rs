//! SQLite catalog of ebook metadata.
//!
//! Books are stored as found, one row per document, while the entities they
//! reference are deduplicated:
//! - **Authors** by their (first, middle, last) name triple. Contact details
//!   (nickname, homepage, email) are overwritten by the latest book stored.
//! - **Genres** and **keywords** by name.
//!
//! Every book is written in a single transaction together with its entities
//! and associations, so a failed write never leaves part of a book behind.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::{Counts, Repository, StoredAuthor, StoredBook};
