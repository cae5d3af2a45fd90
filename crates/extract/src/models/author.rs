use std::fmt::{Display, Formatter, Result as FmtResult};

/// A person credited as an author of a book.
///
/// Two authors are the same person if and only if their [`AuthorKey`]
/// matches. The remaining fields are contact details that get overwritten
/// whenever the same author is encountered again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Author {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub nickname: String,
    pub homepage: String,
    pub email: String,
}

/// Identity of an [`Author`]: the (first, middle, last) name triple.
///
/// Comparison is exact and case-sensitive, performed on trimmed names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuthorKey {
    pub first: String,
    pub middle: String,
    pub last: String,
}
impl AuthorKey {
    pub fn new(first: impl AsRef<str>, middle: impl AsRef<str>, last: impl AsRef<str>) -> Self {
        Self {
            first: first.as_ref().trim().to_string(),
            middle: middle.as_ref().trim().to_string(),
            last: last.as_ref().trim().to_string(),
        }
    }
}

impl Author {
    /// Shorthand for an author known only by name.
    pub fn named(first: impl Into<String>, middle: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first_name: first.into(),
            middle_name: middle.into(),
            last_name: last.into(),
            ..Self::default()
        }
    }

    pub fn key(&self) -> AuthorKey {
        AuthorKey::new(&self.first_name, &self.middle_name, &self.last_name)
    }

    /// Returns `true` if the author carries no information at all.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_empty()
            && self.middle_name.is_empty()
            && self.last_name.is_empty()
            && self.nickname.is_empty()
            && self.homepage.is_empty()
            && self.email.is_empty()
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let names = [&self.first_name, &self.middle_name, &self.last_name];
        let mut parts = names.into_iter().filter(|n| !n.is_empty()).peekable();
        if parts.peek().is_none() {
            return write!(f, "{}", self.nickname);
        }
        let full = parts.map(String::as_str).collect::<Vec<_>>().join(" ");
        write!(f, "{full}")
    }
}
