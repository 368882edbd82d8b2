//! HTTP handlers for the books resource.
//!
//! Write handlers validate the body before touching storage, so the table only
//! ever holds schema-conformant rows.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalog_http::error::AppError;
use serde_json::Value;

use super::models::{BookFilter, BookResponse, BooksResponse, MessageResponse};
use super::repository::{BookRepository, RepositoryError};
use super::schema::{self, ValidationErrors};

/// Dependencies shared by every books handler
#[derive(Clone)]
pub struct BooksState {
    pub repo: Arc<dyn BookRepository>,
}

impl BooksState {
    pub fn new(repo: Arc<dyn BookRepository>) -> Self {
        Self { repo }
    }
}

/// Build the books router; mounted under `/books`.
pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(state)
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::validation(errors.into_messages())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { isbn } => {
                AppError::not_found(format!("There is no book with an isbn '{isbn}'"))
            }
            RepositoryError::Conflict { isbn } => {
                AppError::conflict(format!("Book with ISBN {isbn} already exists"))
            }
            RepositoryError::Unexpected(err) => AppError::Internal(anyhow::Error::new(err)),
        }
    }
}

/// GET / => {books: [book, ...]}
async fn list_books(
    State(state): State<BooksState>,
    filter: Result<Query<BookFilter>, QueryRejection>,
) -> Result<Json<BooksResponse>, AppError> {
    let Query(filter) =
        filter.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let books = state.repo.find_all(&filter).await?;
    Ok(Json(BooksResponse { books }))
}

/// GET /{isbn} => {book: book}
async fn get_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
) -> Result<Json<BookResponse>, AppError> {
    let book = state.repo.find_one(&isbn).await?;
    Ok(Json(BookResponse { book }))
}

/// POST / bookData => 201 {book: newBook}
async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let book = schema::parse_book(json_body(payload)?)?;
    let book = state.repo.create(&book).await?;

    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(BookResponse { book })))
}

/// PUT /{isbn} bookData => {book: updatedBook}
async fn update_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookResponse>, AppError> {
    let book = schema::parse_book(json_body(payload)?)?;

    if book.isbn != isbn {
        tracing::warn!(
            path_isbn = %isbn,
            body_isbn = %book.isbn,
            "update renames book to the isbn given in the body"
        );
    }

    let book = state.repo.update(&isbn, &book).await?;
    Ok(Json(BookResponse { book }))
}

/// DELETE /{isbn} => {message: "Book deleted"}
async fn delete_book(
    State(state): State<BooksState>,
    Path(isbn): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.repo.remove(&isbn).await?;

    tracing::info!(isbn = %isbn, "book deleted");
    Ok(Json(MessageResponse {
        message: "Book deleted",
    }))
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}
