//! Extension-keyed dispatch tables for book formats and containers.

use crate::document::RawDocument;
use crate::error::{ErrorKind, Result};
use crate::path::extension_key;
use bookshelf_archive::{ArchiveExpander, ZipExpander};
use bookshelf_extract::models::Book;
use bookshelf_extract::{Fb2Parser, FormatParser};
use exn::ResultExt;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

/// Maps file extensions to shared handlers.
///
/// Keys are normalized to an uppercase extension with a leading dot, so
/// lookups are case-insensitive.
pub struct Registry<H: ?Sized> {
    handlers: HashMap<String, Arc<H>>,
}

impl<H: ?Sized> Default for Registry<H> {
    fn default() -> Self {
        Self { handlers: HashMap::new() }
    }
}

impl<H: ?Sized> Registry<H> {
    /// Normalize `zip`, `.zip` and `.ZIP` to `.ZIP`.
    pub fn normalize(extension: &str) -> String {
        let extension = extension.trim();
        match extension.starts_with('.') {
            true => extension.to_uppercase(),
            false => format!(".{}", extension.to_uppercase()),
        }
    }

    /// Register a handler for an extension.
    ///
    /// The first handler registered for an extension is kept: returns `false`
    /// (and leaves the registry untouched) if the extension was already taken.
    pub fn register(&mut self, extension: &str, handler: Arc<H>) -> bool {
        let key = Self::normalize(extension);
        if self.handlers.contains_key(&key) {
            tracing::debug!(extension = %key, "Extension already registered; keeping the existing handler");
            return false;
        }
        self.handlers.insert(key, handler);
        true
    }

    pub fn get(&self, name: impl AsRef<Path>) -> Option<&Arc<H>> {
        self.handlers.get(&extension_key(name)?)
    }

    pub fn can_process(&self, name: impl AsRef<Path>) -> bool {
        self.get(name).is_some()
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.handlers.contains_key(key)
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut extensions: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
    }
}

impl<H: ?Sized> Debug for Registry<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_set().entries(self.extensions()).finish()
    }
}

/// Every format the pipeline understands: book formats it parses and
/// containers it looks inside.
///
/// An extension belongs to at most one of the two registries.
#[derive(Debug, Default)]
pub struct Formats {
    books: Registry<dyn FormatParser>,
    containers: Registry<dyn ArchiveExpander>,
}

impl Formats {
    /// FB2 books, stand-alone or inside `.zip`/`.fbz` archives.
    pub fn standard() -> Self {
        let mut formats = Self::default();
        let zip: Arc<dyn ArchiveExpander> = Arc::new(ZipExpander);
        // A fresh set of registries cannot conflict.
        _ = formats.register_book("fb2", Arc::new(Fb2Parser));
        _ = formats.register_container("zip", Arc::clone(&zip));
        _ = formats.register_container("fbz", zip);
        formats
    }

    pub fn register_book(&mut self, extension: &str, parser: Arc<dyn FormatParser>) -> Result<bool> {
        let key = Registry::<dyn FormatParser>::normalize(extension);
        if self.containers.contains(&key) {
            exn::bail!(ErrorKind::AmbiguousExtension(key));
        }
        Ok(self.books.register(&key, parser))
    }

    pub fn register_container(&mut self, extension: &str, expander: Arc<dyn ArchiveExpander>) -> Result<bool> {
        let key = Registry::<dyn ArchiveExpander>::normalize(extension);
        if self.books.contains(&key) {
            exn::bail!(ErrorKind::AmbiguousExtension(key));
        }
        Ok(self.containers.register(&key, expander))
    }

    pub fn books(&self) -> &Registry<dyn FormatParser> {
        &self.books
    }

    pub fn containers(&self) -> &Registry<dyn ArchiveExpander> {
        &self.containers
    }

    /// Parse a document with the parser registered for its extension.
    ///
    /// This is CPU-bound; async callers should run it on a blocking thread.
    pub fn parse(&self, document: RawDocument) -> Result<Book> {
        let Some(parser) = self.books.get(document.extension_source()) else {
            exn::bail!(ErrorKind::UnknownFormat(document.filename));
        };
        let metadata = parser.parse(&document.data).or_raise(|| ErrorKind::Parse(document.full_path()))?;
        Ok(Book::new(metadata, document.into_provenance()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_extract::error::Result as ExtractResult;
    use bookshelf_extract::models::Metadata;
    use rstest::rstest;

    struct Fixed(&'static str);
    impl FormatParser for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn parse(&self, _data: &[u8]) -> ExtractResult<Metadata> {
            Ok(Metadata { title: self.0.to_string(), ..Metadata::default() })
        }
    }

    const FB2: &[u8] = br#"<FictionBook><description><title-info>
        <author><first-name>Jane</first-name><last-name>Doe</last-name></author>
        <book-title>X</book-title>
    </title-info></description></FictionBook>"#;

    #[rstest]
    #[case("zip", ".ZIP")]
    #[case(".zip", ".ZIP")]
    #[case(" .Fb2 ", ".FB2")]
    fn test_normalize(#[case] extension: &str, #[case] expected: &str) {
        assert_eq!(Registry::<dyn FormatParser>::normalize(extension), expected);
    }

    #[rstest]
    #[case("a.fb2", true)]
    #[case("A.FB2", true)]
    #[case("nested/dir/a.Fb2", true)]
    #[case("a.fb2.txt", false)]
    #[case("fb2", false)]
    fn test_lookup_is_case_insensitive(#[case] name: &str, #[case] expected: bool) {
        let formats = Formats::standard();
        assert_eq!(formats.books().can_process(name), expected);
    }

    #[test]
    fn test_standard_formats() {
        let formats = Formats::standard();
        assert_eq!(formats.books().extensions(), [".FB2"]);
        assert_eq!(formats.containers().extensions(), [".FBZ", ".ZIP"]);
        assert_eq!(formats.containers().get("b.fbz").unwrap().name(), "zip");
    }

    #[test]
    fn test_first_registration_wins() {
        let mut registry: Registry<dyn FormatParser> = Registry::default();
        assert!(registry.register("txt", Arc::new(Fixed("first"))));
        assert!(!registry.register(".TXT", Arc::new(Fixed("second"))));
        assert_eq!(registry.get("a.txt").unwrap().name(), "first");
    }

    #[test]
    fn test_extension_cannot_be_book_and_container() {
        let mut formats = Formats::standard();
        let err = formats.register_book("zip", Arc::new(Fixed("zip book"))).unwrap_err();
        assert_eq!(*err, ErrorKind::AmbiguousExtension(".ZIP".to_string()));
        let err = formats.register_container("FB2", Arc::new(ZipExpander)).unwrap_err();
        assert_eq!(*err, ErrorKind::AmbiguousExtension(".FB2".to_string()));
    }

    #[test]
    fn test_custom_format() {
        let mut formats = Formats::standard();
        assert!(formats.register_book("txt", Arc::new(Fixed("plain"))).unwrap());
        let book = formats.parse(RawDocument::new("/books", ".", "notes.txt", b"hello".to_vec())).unwrap();
        assert_eq!(book.title(), "plain");
    }

    #[test]
    fn test_parse_combines_metadata_and_provenance() {
        let formats = Formats::standard();
        let book = formats.parse(RawDocument::new("/books", "sf", "a.fb2", FB2.to_vec())).unwrap();
        assert_eq!(book.title(), "X");
        assert_eq!(book.metadata.authors[0].first_name, "Jane");
        assert_eq!(book.file.full_path(), Path::new("/books/sf/a.fb2"));
        assert_eq!(book.file.size, FB2.len() as u64);
    }

    #[test]
    fn test_parse_unknown_format() {
        let formats = Formats::standard();
        let err = formats.parse(RawDocument::new("/books", ".", "a.epub", Vec::new())).unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownFormat("a.epub".to_string()));
    }

    #[test]
    fn test_parse_failure_names_the_document() {
        let formats = Formats::standard();
        let err = formats.parse(RawDocument::new("/books", "sf", "bad.fb2", b"garbage".to_vec())).unwrap_err();
        assert_eq!(*err, ErrorKind::Parse(Path::new("/books/sf/bad.fb2").to_path_buf()));
    }
}
