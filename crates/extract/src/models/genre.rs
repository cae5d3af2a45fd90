use std::fmt::{Display, Formatter, Result as FmtResult};

/// A genre code or name (FB2 uses codes such as `sf_fantasy`).
///
/// The name is the identity: two genres are the same if the names match
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genre {
    pub name: String,
}
impl Genre {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
impl From<&str> for Genre {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
impl Display for Genre {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}
