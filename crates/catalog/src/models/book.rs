use crate::error::{Error, ErrorKind};
use bookshelf_extract::models::{Book, FileProvenance, Metadata};
use exn::{OptionExt, ResultExt};
use std::path::PathBuf;
use time::UtcDateTime;

/// The scalar columns of a book; associations live in their own tables.
#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) title: String,
    pub(crate) annotation: String,
    pub(crate) bookdate: String,
    pub(crate) publisher: String,
    pub(crate) publish_city: String,
    pub(crate) publish_year: Option<i64>,
    pub(crate) isbn: String,
    pub(crate) lang: String,
    pub(crate) src_lang: String,
    pub(crate) root_path: String,
    pub(crate) relative_path: String,
    pub(crate) filename: String,
    pub(crate) filesize: i64,
    pub(crate) added_at: i64,
}

#[derive(sqlx::FromRow)]
pub(crate) struct IdentifiedBookRow {
    pub(crate) id: i64,
    #[sqlx(flatten)]
    pub(crate) book: BookRow,
}

impl TryFrom<&Book> for BookRow {
    type Error = Error;
    fn try_from(book: &Book) -> Result<Self, Self::Error> {
        let meta = &book.metadata;
        let file = &book.file;
        Ok(Self {
            title: meta.title.clone(),
            annotation: meta.annotation.clone(),
            bookdate: meta.date.clone(),
            publisher: meta.publisher.clone(),
            publish_city: meta.publish_city.clone(),
            publish_year: meta.publish_year.map(i64::from),
            isbn: meta.isbn.clone(),
            lang: meta.lang.clone(),
            src_lang: meta.src_lang.clone(),
            root_path: file.root.to_str().ok_or_raise(|| ErrorKind::InvalidData("root path"))?.to_string(),
            relative_path: file
                .relative_path
                .to_str()
                .ok_or_raise(|| ErrorKind::InvalidData("relative path"))?
                .to_string(),
            filename: file.filename.clone(),
            filesize: i64::try_from(file.size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            added_at: UtcDateTime::now().unix_timestamp(),
        })
    }
}

/// Converts the scalar columns back into a book without authors, genres or
/// keywords, together with the time it was added.
impl TryFrom<BookRow> for (Book, UtcDateTime) {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let publish_year = row
            .publish_year
            .map(i32::try_from)
            .transpose()
            .or_raise(|| ErrorKind::InvalidData("publish year"))?;
        let metadata = Metadata {
            title: row.title,
            annotation: row.annotation,
            date: row.bookdate,
            publisher: row.publisher,
            publish_city: row.publish_city,
            publish_year,
            isbn: row.isbn,
            lang: row.lang,
            src_lang: row.src_lang,
            ..Metadata::default()
        };
        let file = FileProvenance::new(
            PathBuf::from(row.root_path),
            PathBuf::from(row.relative_path),
            row.filename,
            u64::try_from(row.filesize).or_raise(|| ErrorKind::InvalidData("file size"))?,
        );
        let added_at = UtcDateTime::from_unix_timestamp(row.added_at).or_raise(|| ErrorKind::InvalidData("added at"))?;
        Ok((Book::new(metadata, file), added_at))
    }
}
