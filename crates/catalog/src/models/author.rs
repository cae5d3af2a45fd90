use bookshelf_extract::models::Author;

#[derive(sqlx::FromRow)]
pub(crate) struct AuthorRow {
    pub(crate) id: i64,
    first_name: String,
    middle_name: String,
    last_name: String,
    nickname: String,
    homepage: String,
    email: String,
}
impl From<AuthorRow> for (i64, Author) {
    fn from(row: AuthorRow) -> Self {
        let author = Author {
            first_name: row.first_name,
            middle_name: row.middle_name,
            last_name: row.last_name,
            nickname: row.nickname,
            homepage: row.homepage,
            email: row.email,
        };
        (row.id, author)
    }
}
