//! Dedup-upsert repository for books and the entities they reference.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{AuthorRow, BookRow, IdentifiedBookRow};
use bookshelf_extract::models::{Author, AuthorKey, Book, Genre, Keyword};
use exn::ResultExt;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashSet;
use time::UtcDateTime;
use tracing::instrument;

/// A book read back from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBook {
    pub id: i64,
    /// Authors, genres and keywords are in the order the book listed them.
    pub book: Book,
    pub added_at: UtcDateTime,
}

/// An author read back from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuthor {
    pub id: i64,
    pub author: Author,
}

/// Number of rows in each entity table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct Counts {
    pub books: i64,
    pub authors: i64,
    pub genres: i64,
    pub keywords: i64,
}

/// Repository writing books to, and reading them back from, the catalog.
///
/// # Relationships
///
/// - A book is never deduplicated: storing the same file twice yields two rows.
/// - Authors are shared between books by [`AuthorKey`]; genres and keywords
///   by name.
/// - Association rows remember the position of the entity within its book.
///   Listing the same entity twice in one book associates it once, at its
///   first position.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self::new(db.pool().clone())
    }
}
impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Store a book with its authors, genres and keywords, returning the new
    /// book's id.
    ///
    /// Everything happens in one transaction: on error nothing of this book
    /// remains, not even entities that were upserted for it.
    #[instrument(skip_all, fields(title = %book.title(), path = %book.file))]
    pub async fn store_book(&self, book: &Book) -> Result<i64> {
        let row = BookRow::try_from(book)?;
        let meta = &book.metadata;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;

        let mut author_ids = Vec::with_capacity(meta.authors.len());
        for author in &meta.authors {
            author_ids.push(Self::upsert_author(&mut tx, author).await?);
        }
        let mut genre_ids = Vec::with_capacity(meta.genres.len());
        for Genre { name } in &meta.genres {
            genre_ids.push(Self::upsert_name(&mut tx, include_str!("../queries/upsert_genre.sql"), name).await?);
        }
        let mut keyword_ids = Vec::with_capacity(meta.keywords.len());
        for Keyword { name } in &meta.keywords {
            keyword_ids.push(Self::upsert_name(&mut tx, include_str!("../queries/upsert_keyword.sql"), name).await?);
        }

        let book_id: i64 = sqlx::query_scalar(include_str!("../queries/insert_book.sql"))
            .bind(row.title)
            .bind(row.annotation)
            .bind(row.bookdate)
            .bind(row.publisher)
            .bind(row.publish_city)
            .bind(row.publish_year)
            .bind(row.isbn)
            .bind(row.lang)
            .bind(row.src_lang)
            .bind(row.root_path)
            .bind(row.relative_path)
            .bind(row.filename)
            .bind(row.filesize)
            .bind(row.added_at)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;

        Self::link(&mut tx, include_str!("../queries/link_author.sql"), book_id, &author_ids).await?;
        Self::link(&mut tx, include_str!("../queries/link_genre.sql"), book_id, &genre_ids).await?;
        if !keyword_ids.is_empty() {
            Self::link(&mut tx, include_str!("../queries/link_keyword.sql"), book_id, &keyword_ids).await?;
        }

        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(book_id, authors = author_ids.len(), genres = genre_ids.len(), "Stored book");
        Ok(book_id)
    }

    async fn upsert_author(tx: &mut Transaction<'_, Sqlite>, author: &Author) -> Result<i64> {
        let AuthorKey { first, middle, last } = author.key();
        sqlx::query_scalar(include_str!("../queries/upsert_author.sql"))
            .bind(first)
            .bind(middle)
            .bind(last)
            .bind(&author.nickname)
            .bind(&author.homepage)
            .bind(&author.email)
            .fetch_one(&mut **tx)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    async fn upsert_name(tx: &mut Transaction<'_, Sqlite>, query: &'static str, name: &str) -> Result<i64> {
        sqlx::query_scalar(query).bind(name).fetch_one(&mut **tx).await.or_raise(|| ErrorKind::Database)
    }

    async fn link(tx: &mut Transaction<'_, Sqlite>, query: &'static str, book_id: i64, ids: &[i64]) -> Result<()> {
        let mut seen = HashSet::with_capacity(ids.len());
        let unique = ids.iter().copied().filter(|id| seen.insert(*id));
        for (position, entity_id) in unique.enumerate() {
            let position = i64::try_from(position).or_raise(|| ErrorKind::InvalidData("position"))?;
            sqlx::query(query)
                .bind(book_id)
                .bind(entity_id)
                .bind(position)
                .execute(&mut **tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Get a book, with its authors, genres and keywords, by id.
    pub async fn get_book(&self, id: i64) -> Result<Option<StoredBook>> {
        let row: Option<IdentifiedBookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    /// Get every book in the catalog, in insertion order.
    pub async fn list_books(&self) -> Result<Vec<StoredBook>> {
        let rows: Vec<IdentifiedBookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut books = Vec::with_capacity(rows.len());
        for row in rows {
            books.push(self.hydrate(row).await?);
        }
        Ok(books)
    }

    async fn hydrate(&self, row: IdentifiedBookRow) -> Result<StoredBook> {
        let (mut book, added_at) = <(Book, UtcDateTime)>::try_from(row.book)?;
        let authors: Vec<AuthorRow> = sqlx::query_as(include_str!("../queries/get_book_authors.sql"))
            .bind(row.id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let genres: Vec<String> = sqlx::query_scalar(include_str!("../queries/get_book_genres.sql"))
            .bind(row.id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let keywords: Vec<String> = sqlx::query_scalar(include_str!("../queries/get_book_keywords.sql"))
            .bind(row.id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        book.metadata.authors = authors.into_iter().map(|a| <(i64, Author)>::from(a).1).collect();
        book.metadata.genres = genres.into_iter().map(Genre::new).collect();
        book.metadata.keywords = keywords.into_iter().map(Keyword::new).collect();
        Ok(StoredBook { id: row.id, book, added_at })
    }

    /// Look an author up by their dedup key.
    pub async fn find_author(&self, key: &AuthorKey) -> Result<Option<StoredAuthor>> {
        let row: Option<AuthorRow> = sqlx::query_as(include_str!("../queries/find_author.sql"))
            .bind(&key.first)
            .bind(&key.middle)
            .bind(&key.last)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(|row| {
            let (id, author) = row.into();
            StoredAuthor { id, author }
        }))
    }

    /// Ids of every book associated with the given author.
    pub async fn books_by_author(&self, author_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar(include_str!("../queries/get_books_by_author.sql"))
            .bind(author_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn counts(&self) -> Result<Counts> {
        sqlx::query_as(include_str!("../queries/counts.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}
