use std::fmt::{Display, Formatter, Result as FmtResult};

/// A free-form keyword attached to a book.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyword {
    pub name: String,
}
impl Keyword {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
impl From<&str> for Keyword {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}

/// Splits a comma-separated keyword list into trimmed, non-empty keywords.
///
/// ```
/// use bookshelf_extract::models::{Keyword, split_keywords};
/// assert_eq!(
///     split_keywords("alpha,  beta ,gamma"),
///     vec![Keyword::new("alpha"), Keyword::new("beta"), Keyword::new("gamma")],
/// );
/// ```
pub fn split_keywords(list: &str) -> Vec<Keyword> {
    list.split(',').map(str::trim).filter(|k| !k.is_empty()).map(Keyword::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alpha,  beta ,gamma", &["alpha", "beta", "gamma"])]
    #[case("alpha,,beta", &["alpha", "beta"])]
    #[case(" , ,", &[])]
    #[case("", &[])]
    #[case("single", &["single"])]
    #[case("space inside, kept", &["space inside", "kept"])]
    fn test_split_keywords(#[case] input: &str, #[case] expected: &[&str]) {
        let names: Vec<String> = split_keywords(input).into_iter().map(|k| k.name).collect();
        assert_eq!(names, expected);
    }
}
