use super::Metadata;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// Where a book was found.
///
/// For documents read from inside an archive, `relative_path` is the
/// directory of the archive itself and `filename` is the full entry name
/// within the archive (which may contain `/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileProvenance {
    /// The directory the scan started from.
    pub root: PathBuf,
    /// Directory relative to `root`, `"."` for the root itself.
    pub relative_path: PathBuf,
    pub filename: String,
    /// Size of the document in bytes (uncompressed, for archive entries).
    pub size: u64,
}
impl FileProvenance {
    pub fn new(
        root: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        filename: impl Into<String>,
        size: u64,
    ) -> Self {
        let relative_path = relative_path.into();
        Self {
            root: root.into(),
            relative_path: match relative_path.as_os_str().is_empty() {
                true => PathBuf::from("."),
                false => relative_path,
            },
            filename: filename.into(),
            size,
        }
    }

    /// The full location of the document, joined for display and logging.
    pub fn full_path(&self) -> PathBuf {
        let base = match self.relative_path == Path::new(".") {
            true => self.root.clone(),
            false => self.root.join(&self.relative_path),
        };
        base.join(&self.filename)
    }
}
impl Display for FileProvenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.full_path().display())
    }
}

/// A successfully parsed document: its metadata plus where it came from.
///
/// Books are never deduplicated; the same file found at two locations is two
/// books.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub metadata: Metadata,
    pub file: FileProvenance,
}
impl Book {
    pub fn new(metadata: Metadata, file: FileProvenance) -> Self {
        Self { metadata, file }
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }
}
