//! Path helpers shared by the walker, the registries and the provenance of
//! archive entries.
//!
//! Archive entry names always use `/` as separator, which every platform's
//! [`Path`] accepts, so the same helpers serve both.

use std::path::{Component, Path, PathBuf};

/// The relative directory of files found directly under the root.
pub const CURRENT_DIR: &str = ".";

/// The uppercased extension, including the leading dot, of the final element
/// of `name`.
///
/// ```
/// use bookshelf_library::path::extension_key;
/// assert_eq!(extension_key("books/novel.Fb2").as_deref(), Some(".FB2"));
/// assert_eq!(extension_key("archive.tar.zip").as_deref(), Some(".ZIP"));
/// assert_eq!(extension_key(".fb2").as_deref(), Some(".FB2"));
/// assert_eq!(extension_key("README"), None);
/// ```
pub fn extension_key(name: impl AsRef<Path>) -> Option<String> {
    let leaf = name.as_ref().file_name()?.to_str()?;
    let dot = leaf.rfind('.')?;
    match &leaf[dot..] {
        "." => None,
        extension => Some(extension.to_uppercase()),
    }
}

/// Join a root, a root-relative directory and a filename back together.
///
/// An empty or `"."` relative directory is the root itself.
pub fn full_path(root: impl AsRef<Path>, relative: impl AsRef<Path>, filename: impl AsRef<Path>) -> PathBuf {
    let root = root.as_ref();
    let relative = relative.as_ref();
    let base = match is_current_dir(relative) {
        true => root.to_path_buf(),
        false => root.join(relative),
    };
    base.join(filename)
}

/// Split a root-relative file path into its directory and filename.
///
/// Files directly under the root get [`CURRENT_DIR`] as their directory.
pub fn split(relative: impl AsRef<Path>) -> (PathBuf, String) {
    let relative = relative.as_ref();
    let filename = relative.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let directory = match relative.parent() {
        Some(parent) if !is_current_dir(parent) => parent.to_path_buf(),
        _ => PathBuf::from(CURRENT_DIR),
    };
    (directory, filename)
}

/// Strip the root prefix from a walked path. Returns `None` for paths that are
/// not inside `root`.
pub fn relative_to(root: impl AsRef<Path>, path: impl AsRef<Path>) -> Option<PathBuf> {
    path.as_ref().strip_prefix(root.as_ref()).ok().map(Path::to_path_buf)
}

fn is_current_dir(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.fb2", Some(".FB2"))]
    #[case("a.FB2", Some(".FB2"))]
    #[case("dir/sub/a.Fbz", Some(".FBZ"))]
    #[case("dir.zip/a", None)]
    #[case("a.b.c.zip", Some(".ZIP"))]
    #[case("README", None)]
    #[case("trailing.", None)]
    #[case("", None)]
    fn test_extension_key(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(extension_key(name).as_deref(), expected);
    }

    #[rstest]
    #[case("/books", ".", "a.fb2", "/books/a.fb2")]
    #[case("/books", "", "a.fb2", "/books/a.fb2")]
    #[case("/books", "sf/old", "a.fb2", "/books/sf/old/a.fb2")]
    #[case("/books", "sf", "inner/c.fb2", "/books/sf/inner/c.fb2")]
    fn test_full_path(#[case] root: &str, #[case] relative: &str, #[case] filename: &str, #[case] expected: &str) {
        assert_eq!(full_path(root, relative, filename), Path::new(expected));
    }

    #[rstest]
    #[case("a.fb2", ".", "a.fb2")]
    #[case("sf/a.fb2", "sf", "a.fb2")]
    #[case("sf/old/b.zip", "sf/old", "b.zip")]
    fn test_split(#[case] relative: &str, #[case] directory: &str, #[case] filename: &str) {
        assert_eq!(split(relative), (PathBuf::from(directory), filename.to_string()));
    }

    #[test]
    fn test_relative_to() {
        assert_eq!(relative_to("/books", "/books/sf/a.fb2"), Some(PathBuf::from("sf/a.fb2")));
        assert_eq!(relative_to("/books", "/other/a.fb2"), None);
    }

    #[test]
    fn test_split_then_join_is_identity() {
        let (directory, filename) = split("sf/old/a.fb2");
        assert_eq!(full_path("/books", directory, filename), Path::new("/books/sf/old/a.fb2"));
        let (directory, filename) = split("a.fb2");
        assert_eq!(full_path("/books", directory, filename), Path::new("/books/a.fb2"));
    }
}
