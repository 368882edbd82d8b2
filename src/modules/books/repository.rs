//! Storage access for the `books` table.

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use super::models::{Book, BookFilter};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("no book found with ISBN {isbn}")]
    NotFound { isbn: String },

    #[error("book with ISBN {isbn} already exists")]
    Conflict { isbn: String },

    #[error("storage failure: {0}")]
    Unexpected(#[from] sqlx::Error),
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Books in insertion order, optionally narrowed by ISBN.
    async fn find_all(&self, filter: &BookFilter) -> Result<Vec<Book>, RepositoryError>;

    async fn find_one(&self, isbn: &str) -> Result<Book, RepositoryError>;

    /// Insert `book`; a duplicate ISBN is reported as [`RepositoryError::Conflict`].
    async fn create(&self, book: &Book) -> Result<Book, RepositoryError>;

    /// Overwrite every column of the row located by `isbn`, including the ISBN
    /// itself when `book.isbn` differs.
    async fn update(&self, isbn: &str, book: &Book) -> Result<Book, RepositoryError>;

    async fn remove(&self, isbn: &str) -> Result<(), RepositoryError>;
}

/// [`BookRepository`] backed by a SQLite pool. Every call borrows one pooled
/// connection for a single statement.
#[derive(Clone)]
pub struct SqlBookRepository {
    pool: SqlitePool,
}

impl SqlBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for SqlBookRepository {
    async fn find_all(&self, filter: &BookFilter) -> Result<Vec<Book>, RepositoryError> {
        let books = match &filter.isbn {
            Some(isbn) => {
                sqlx::query_as::<_, Book>(
                    "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
                     FROM books WHERE isbn = ? ORDER BY id",
                )
                .bind(isbn)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Book>(
                    "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
                     FROM books ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(books)
    }

    async fn find_one(&self, isbn: &str) -> Result<Book, RepositoryError> {
        sqlx::query_as::<_, Book>(
            "SELECT isbn, amazon_url, author, language, pages, publisher, title, year
             FROM books WHERE isbn = ?",
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            isbn: isbn.to_string(),
        })
    }

    async fn create(&self, book: &Book) -> Result<Book, RepositoryError> {
        let created = sqlx::query_as::<_, Book>(
            "INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| classify_write_error(err, &book.isbn))?;

        tracing::debug!(isbn = %created.isbn, "book created");
        Ok(created)
    }

    async fn update(&self, isbn: &str, book: &Book) -> Result<Book, RepositoryError> {
        let updated = sqlx::query_as::<_, Book>(
            "UPDATE books
             SET isbn = ?, amazon_url = ?, author = ?, language = ?,
                 pages = ?, publisher = ?, title = ?, year = ?
             WHERE isbn = ?
             RETURNING isbn, amazon_url, author, language, pages, publisher, title, year",
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| classify_write_error(err, &book.isbn))?;

        updated.ok_or_else(|| RepositoryError::NotFound {
            isbn: isbn.to_string(),
        })
    }

    async fn remove(&self, isbn: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                isbn: isbn.to_string(),
            });
        }

        tracing::debug!(isbn, "book removed");
        Ok(())
    }
}

/// Unique-constraint violations become conflicts on `isbn`.
fn classify_write_error(err: sqlx::Error, isbn: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict {
                isbn: isbn.to_string(),
            };
        }
    }
    RepositoryError::Unexpected(err)
}
