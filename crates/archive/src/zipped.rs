//! Zip containers (`.zip`, and `.fbz` which is a zip holding FB2 files).

use crate::error::{ErrorKind, Result};
use crate::{ArchiveExpander, Entry, Expansion};
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::instrument;
use zip::ZipArchive;

// Entry headers are not to be trusted with allocations; anything larger grows
// the buffer as it is actually read.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExpander;

impl ArchiveExpander for ZipExpander {
    fn name(&self) -> &'static str {
        "zip"
    }

    #[instrument(skip(self, select, visit), fields(path = %path.display()))]
    fn expand(
        &self,
        path: &Path,
        select: &dyn Fn(&str) -> bool,
        visit: &mut dyn FnMut(Entry) -> ControlFlow<()>,
    ) -> Result<Expansion> {
        let file = File::open(path).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
        let mut archive = ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
        let mut expansion = Expansion::default();
        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!(path = %path.display(), index, %error, "Unable to open archive entry; skipping");
                    expansion.unreadable += 1;
                    continue;
                },
            };
            let name = entry.name().to_string();
            if entry.is_dir() || !select(&name) {
                expansion.ignored += 1;
                continue;
            }
            let capacity = usize::try_from(entry.size().min(MAX_PREALLOCATION)).unwrap_or_default();
            let mut data = Vec::with_capacity(capacity);
            if let Err(error) = entry.read_to_end(&mut data) {
                tracing::warn!(path = %path.display(), entry = %name, %error, "Unable to read archive entry; skipping");
                expansion.unreadable += 1;
                continue;
            }
            expansion.extracted += 1;
            if visit(Entry { name, data }).is_break() {
                expansion.stopped = true;
                break;
            }
        }
        Ok(expansion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
                continue;
            }
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    fn is_fb2(name: &str) -> bool {
        name.to_lowercase().ends_with(".fb2")
    }

    fn collect(path: &Path) -> (Vec<Entry>, Expansion) {
        let mut entries = Vec::new();
        let expansion = ZipExpander
            .expand(path, &is_fb2, &mut |entry| {
                entries.push(entry);
                ControlFlow::Continue(())
            })
            .unwrap();
        (entries, expansion)
    }

    #[test]
    fn test_fan_out_selects_recognized_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_zip(
            &path,
            &[
                ("one.fb2", b"1"),
                ("readme.txt", b"ignored"),
                ("nested/", b""),
                ("nested/two.FB2", b"22"),
                ("cover.jpg", b"ignored"),
                ("nested/deeper/three.fb2", b"333"),
            ],
        );
        let (entries, expansion) = collect(&path);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["one.fb2", "nested/two.FB2", "nested/deeper/three.fb2"]);
        assert_eq!(entries[2].data, b"333");
        assert_eq!(expansion.extracted, 3);
        assert_eq!(expansion.ignored, 3);
        assert_eq!(expansion.unreadable, 0);
        assert!(!expansion.stopped);
    }

    #[test]
    fn test_corrupt_entry_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_zip(
            &path,
            &[("first.fb2", b"first"), ("broken.fb2", b"PAYLOAD-TO-CORRUPT"), ("last.fb2", b"last")],
        );
        // Flip the stored bytes so the entry no longer matches its CRC.
        let mut bytes = std::fs::read(&path).unwrap();
        let needle = b"PAYLOAD-TO-CORRUPT";
        let offset = bytes.windows(needle.len()).position(|w| w == needle).unwrap();
        bytes[offset..offset + needle.len()].copy_from_slice(b"payload-corrupted!");
        std::fs::write(&path, bytes).unwrap();

        let (entries, expansion) = collect(&path);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first.fb2", "last.fb2"]);
        assert_eq!(expansion.unreadable, 1);
    }

    #[test]
    fn test_visitor_can_stop_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        write_zip(&path, &[("a.fb2", b"a"), ("b.fb2", b"b"), ("c.fb2", b"c")]);
        let mut seen = 0;
        let expansion = ZipExpander
            .expand(&path, &is_fb2, &mut |_| {
                seen += 1;
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(seen, 1);
        assert!(expansion.stopped);
    }

    #[test]
    fn test_not_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"definitely not a zip file").unwrap();
        let err = ZipExpander.expand(&path, &is_fb2, &mut |_| ControlFlow::Continue(())).unwrap_err();
        assert_eq!(*err, ErrorKind::Open(path));
    }

    #[test]
    fn test_missing_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.zip");
        let err = ZipExpander.expand(&path, &is_fb2, &mut |_| ControlFlow::Continue(())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Open(_)));
    }

    #[test]
    fn test_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.zip");
        write_zip(&path, &[]);
        let (entries, expansion) = collect(&path);
        assert!(entries.is_empty());
        assert_eq!(expansion, Expansion::default());
    }
}
