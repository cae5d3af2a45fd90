mod author;
mod book;
mod genre;
mod keyword;
mod metadata;

pub use self::author::{Author, AuthorKey};
pub use self::book::{Book, FileProvenance};
pub use self::genre::Genre;
pub use self::keyword::{Keyword, split_keywords};
pub use self::metadata::Metadata;
