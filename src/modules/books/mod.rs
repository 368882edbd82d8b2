pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use sqlx::SqlitePool;

use repository::{BookRepository, SqlBookRepository};
use routes::BooksState;

/// Table backing the books resource. `id` only records insertion order.
pub const BOOKS_SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        isbn       TEXT    NOT NULL UNIQUE,
        amazon_url TEXT    NOT NULL,
        author     TEXT    NOT NULL,
        language   TEXT    NOT NULL,
        pages      INTEGER NOT NULL,
        publisher  TEXT    NOT NULL,
        title      TEXT    NOT NULL,
        year       INTEGER NOT NULL
    );
"#;

/// Books module: CRUD over the `books` table
pub struct BooksModule {
    repo: Arc<dyn BookRepository>,
}

impl BooksModule {
    pub fn new(repo: Arc<dyn BookRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(ctx.db)
            .await?;

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            stored,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(BooksState::new(self.repo.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book_response = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/BookResponse" }
                    }
                }
            })
        };
        let isbn_parameter = json!({
            "name": "isbn",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        });
        let book_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "isbn",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": {
                                "description": "All books in insertion order",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/BooksResponse" }
                                    }
                                }
                            },
                            "500": error_response("Internal server error")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_body,
                        "responses": {
                            "201": book_response("Book created"),
                            "400": error_response("Invalid payload or duplicate ISBN")
                        }
                    }
                },
                "/{isbn}": {
                    "get": {
                        "summary": "Get a book",
                        "tags": ["Books"],
                        "parameters": [isbn_parameter],
                        "responses": {
                            "200": book_response("The book"),
                            "404": error_response("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a book",
                        "tags": ["Books"],
                        "parameters": [isbn_parameter],
                        "requestBody": book_body,
                        "responses": {
                            "200": book_response("Book updated"),
                            "400": error_response("Invalid payload"),
                            "404": error_response("Book not found")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [isbn_parameter],
                        "responses": {
                            "200": {
                                "description": "Book deleted",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "object",
                                            "properties": { "message": { "type": "string" } },
                                            "required": ["message"]
                                        }
                                    }
                                }
                            },
                            "404": error_response("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": schema::json_schema(),
                    "BookResponse": {
                        "type": "object",
                        "properties": { "book": { "$ref": "#/components/schemas/Book" } },
                        "required": ["book"]
                    },
                    "BooksResponse": {
                        "type": "object",
                        "properties": {
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["books"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_books",
            up: BOOKS_SCHEMA_SQL,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module backed by `pool`
pub fn create_module(pool: SqlitePool) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(SqlBookRepository::new(pool))))
}
