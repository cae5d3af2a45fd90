use crate::path;
use bookshelf_extract::models::FileProvenance;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// An unparsed document waiting in the queue for a parse worker.
///
/// Owned by exactly one pipeline stage at a time: it is moved into the queue
/// by the walker and out of it by a single worker.
pub struct RawDocument {
    pub root: PathBuf,
    /// Directory relative to `root`; for archive entries, the directory of the
    /// archive.
    pub relative_path: PathBuf,
    /// File name, or the full entry name for documents read from an archive.
    pub filename: String,
    pub size: u64,
    pub data: Vec<u8>,
}

impl RawDocument {
    pub fn new(
        root: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        filename: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            root: root.into(),
            relative_path: relative_path.into(),
            filename: filename.into(),
            size: u64::try_from(data.len()).unwrap_or(u64::MAX),
            data,
        }
    }

    pub fn full_path(&self) -> PathBuf {
        path::full_path(&self.root, &self.relative_path, &self.filename)
    }

    /// Discard the bytes, keeping where the document was found.
    pub fn into_provenance(self) -> FileProvenance {
        FileProvenance::new(self.root, self.relative_path, self.filename, self.size)
    }

    pub(crate) fn extension_source(&self) -> &Path {
        Path::new(&self.filename)
    }
}

// Payload omitted, documents can be megabytes.
impl Debug for RawDocument {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RawDocument")
            .field("root", &self.root)
            .field("relative_path", &self.relative_path)
            .field("filename", &self.filename)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_entry_provenance() {
        let doc = RawDocument::new("/books", "sf", "inner/c.fb2", b"<FictionBook/>".to_vec());
        assert_eq!(doc.size, 14);
        assert_eq!(doc.full_path(), Path::new("/books/sf/inner/c.fb2"));
        let file = doc.into_provenance();
        assert_eq!(file.relative_path, Path::new("sf"));
        assert_eq!(file.filename, "inner/c.fb2");
        assert_eq!(file.size, 14);
    }

    #[test]
    fn test_debug_omits_payload() {
        let doc = RawDocument::new("/books", ".", "a.fb2", vec![b'x'; 1024]);
        let debug = format!("{doc:?}");
        assert!(debug.contains("a.fb2"));
        assert!(!debug.contains("xxxx"));
    }
}
