use super::{Author, Genre, Keyword};

/// Bibliographic metadata extracted from a single document.
///
/// Every text field is trimmed and may be empty; format parsers never fail
/// because an optional field is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
    /// Plain-text annotation, paragraphs separated by newlines.
    pub annotation: String,
    /// Free-text date as written in the document (e.g. `"2007"`, `"1 May 1999"`).
    pub date: String,
    pub publisher: String,
    pub publish_city: String,
    /// `None` when absent or not a number.
    pub publish_year: Option<i32>,
    pub isbn: String,
    /// Language of the content.
    pub lang: String,
    /// Language of the original, for translations.
    pub src_lang: String,
    /// Authors in document order.
    pub authors: Vec<Author>,
    /// Genres in document order.
    pub genres: Vec<Genre>,
    /// Keywords in document order.
    pub keywords: Vec<Keyword>,
}
