//! FictionBook 2 metadata extraction.
//!
//! Only the `<description>` block is read: the parser stops as soon as it is
//! closed, so the (potentially huge, base64-laden) body of the book is never
//! tokenized.

use crate::error::{ErrorKind, Result};
use crate::models::{Author, Genre, Metadata, split_keywords};
use crate::parser::FormatParser;
use exn::ResultExt;
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesText, Event};
use tracing::instrument;

const ROOT: &str = "FictionBook";
/// Elements inside an annotation that start a new paragraph.
const BLOCKS: [&str; 6] = ["p", "subtitle", "v", "stanza", "text-author", "empty-line"];

/// The [`FormatParser`] for `.fb2` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fb2Parser;
impl FormatParser for Fb2Parser {
    fn name(&self) -> &'static str {
        "FictionBook 2"
    }

    fn parse(&self, data: &[u8]) -> Result<Metadata> {
        parse_fb2(data)
    }
}

/// Extracts [`Metadata`] from the `<description>` of an FB2 document.
///
/// Authors are taken from `<title-info>` only (the `<document-info>` authors
/// are whoever made the file, not who wrote the book). Missing fields are left
/// empty.
///
/// # Examples
///
/// ```
/// let fb2 = br#"<?xml version="1.0" encoding="utf-8"?>
/// <FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0">
///   <description>
///     <title-info>
///       <genre>sf</genre>
///       <author><first-name>Jane</first-name><last-name>Doe</last-name></author>
///       <book-title>Example</book-title>
///       <keywords>alpha, beta</keywords>
///     </title-info>
///   </description>
/// </FictionBook>"#;
/// let metadata = bookshelf_extract::parse_fb2(fb2).unwrap();
/// assert_eq!(metadata.title, "Example");
/// assert_eq!(metadata.authors[0].last_name, "Doe");
/// assert_eq!(metadata.keywords.len(), 2);
/// ```
#[instrument(skip(data), fields(size = data.len()))]
pub fn parse_fb2(data: &[u8]) -> Result<Metadata> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut state = State::default();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .or_raise(|| ErrorKind::MalformedXml(u64::try_from(reader.buffer_position()).unwrap_or_default()))?;
        match event {
            Event::Start(e) => state.open(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())?,
            Event::End(_) => {
                if state.close() {
                    break;
                }
            },
            Event::Text(e) => state.text(&e, reader.decoder())?,
            Event::CData(e) => {
                if state.field().is_some() {
                    let text =
                        reader.decoder().decode(&e).or_raise(|| ErrorKind::Encoding(state.element().to_string()))?;
                    state.append(&text);
                }
            },
            Event::Eof => {
                if !state.seen_root {
                    exn::bail!(ErrorKind::InvalidDocument);
                }
                if !state.stack.is_empty() {
                    exn::bail!(ErrorKind::Truncated);
                }
                break;
            },
            _ => {},
        }
        buf.clear();
    }
    Ok(state.finish())
}

#[derive(Default)]
struct State {
    stack: Vec<String>,
    seen_root: bool,
    metadata: Metadata,
    keywords: String,
    year: String,
    annotation: Vec<String>,
}

impl State {
    fn element(&self) -> &str {
        self.stack.last().map(String::as_str).unwrap_or_default()
    }

    fn in_annotation(&self) -> bool {
        matches!(
            self.stack.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
            [ROOT, "description", "title-info", "annotation", ..]
        )
    }

    fn open(&mut self, name: String) -> Result<()> {
        if !self.seen_root {
            if name != ROOT {
                exn::bail!(ErrorKind::InvalidDocument);
            }
            self.seen_root = true;
        }
        let in_title_info = self.stack.len() == 3 && self.element() == "title-info" && self.stack[1] == "description";
        match name.as_str() {
            "author" if in_title_info => self.metadata.authors.push(Author::default()),
            "genre" if in_title_info => self.metadata.genres.push(Genre::new("")),
            block if self.in_annotation() && BLOCKS.contains(&block) => self.annotation.push(String::new()),
            _ => {},
        }
        self.stack.push(name);
        Ok(())
    }

    /// Returns `true` once the description has been closed and there is
    /// nothing left worth reading.
    fn close(&mut self) -> bool {
        let name = self.stack.pop().unwrap_or_default();
        let in_title_info = self.stack.len() == 3 && self.element() == "title-info";
        match name.as_str() {
            "author" if in_title_info => {
                if self.metadata.authors.last().is_some_and(Author::is_empty) {
                    self.metadata.authors.pop();
                }
            },
            "genre" if in_title_info => {
                if self.metadata.genres.last().is_some_and(|g| g.name.trim().is_empty()) {
                    self.metadata.genres.pop();
                }
            },
            "description" => return self.stack.len() == 1,
            _ => {},
        }
        false
    }

    /// `decoder` follows the encoding declared in the XML prolog.
    fn text(&mut self, text: &BytesText<'_>, decoder: Decoder) -> Result<()> {
        if self.field().is_none() {
            return Ok(());
        }
        let decoded = match text.unescape() {
            Ok(s) => s.into_owned(),
            // Unknown entities (FB2 in the wild is full of `&nbsp;`) are kept
            // verbatim rather than failing the whole book.
            Err(_) => decoder
                .decode(text)
                .or_raise(|| ErrorKind::Encoding(self.element().to_string()))?
                .into_owned(),
        };
        self.append(&decoded);
        Ok(())
    }

    fn append(&mut self, text: &str) {
        if let Some(field) = self.field() {
            field.push_str(text);
        }
    }

    /// The string that text at the current position belongs to, if any.
    fn field(&mut self) -> Option<&mut String> {
        let Self { stack, metadata, keywords, year, annotation, .. } = self;
        let path: Vec<&str> = stack.iter().map(String::as_str).collect();
        match path.as_slice() {
            [ROOT, "description", "title-info", rest @ ..] => match rest {
                ["book-title"] => Some(&mut metadata.title),
                ["genre"] => metadata.genres.last_mut().map(|g| &mut g.name),
                ["keywords"] => Some(keywords),
                ["date"] => Some(&mut metadata.date),
                ["lang"] => Some(&mut metadata.lang),
                ["src-lang"] => Some(&mut metadata.src_lang),
                ["author", field] => {
                    let author = metadata.authors.last_mut()?;
                    match *field {
                        "first-name" => Some(&mut author.first_name),
                        "middle-name" => Some(&mut author.middle_name),
                        "last-name" => Some(&mut author.last_name),
                        "nickname" => Some(&mut author.nickname),
                        "home-page" => Some(&mut author.homepage),
                        "email" => Some(&mut author.email),
                        _ => None,
                    }
                },
                ["annotation", ..] => {
                    if annotation.is_empty() {
                        annotation.push(String::new());
                    }
                    annotation.last_mut()
                },
                _ => None,
            },
            [ROOT, "description", "publish-info", leaf] => match *leaf {
                "publisher" => Some(&mut metadata.publisher),
                "city" => Some(&mut metadata.publish_city),
                "year" => Some(year),
                "isbn" => Some(&mut metadata.isbn),
                _ => None,
            },
            _ => None,
        }
    }

    fn finish(self) -> Metadata {
        let Self { mut metadata, keywords, year, annotation, .. } = self;
        for field in [
            &mut metadata.title,
            &mut metadata.date,
            &mut metadata.publisher,
            &mut metadata.publish_city,
            &mut metadata.isbn,
            &mut metadata.lang,
            &mut metadata.src_lang,
        ] {
            trim_in_place(field);
        }
        for author in &mut metadata.authors {
            for field in [
                &mut author.first_name,
                &mut author.middle_name,
                &mut author.last_name,
                &mut author.nickname,
                &mut author.homepage,
                &mut author.email,
            ] {
                trim_in_place(field);
            }
        }
        for genre in &mut metadata.genres {
            trim_in_place(&mut genre.name);
        }
        metadata.annotation =
            annotation.iter().map(|p| p.trim()).filter(|p| !p.is_empty()).collect::<Vec<_>>().join("\n");
        metadata.publish_year = year.trim().parse().ok();
        metadata.keywords = split_keywords(&keywords);
        metadata
    }
}

fn trim_in_place(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}
