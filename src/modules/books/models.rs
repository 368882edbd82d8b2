use serde::{Deserialize, Serialize};

/// A catalogued book, keyed by its ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Unique identifier and lookup key
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    /// Always at least 1
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

/// Equality filter accepted by the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub isbn: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub book: Book,
}

#[derive(Debug, Serialize)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
