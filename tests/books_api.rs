//! End-to-end tests for the books API against an in-memory SQLite database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use catalog_kernel::settings::{DatabaseSettings, Settings};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    pool: SqlitePool,
}

impl TestApp {
    async fn new() -> Self {
        let settings = Settings {
            database: DatabaseSettings {
                url: "sqlite::memory:".to_string(),
                ..DatabaseSettings::default()
            },
            ..Settings::default()
        };
        let pool = catalog_db::connect(&settings.database).await.unwrap();
        let registry = catalog_app::bootstrap(&settings, &pool).await.unwrap();
        let router = catalog_http::build_router(&registry, &settings);
        Self { router, pool }
    }

    async fn seeded() -> Self {
        let app = Self::new().await;
        for book in [test_book(), test_book_2()] {
            let (status, _) = app.send(Method::POST, "/books", Some(book)).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        app
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let parsed = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, parsed)
    }

    async fn row_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn test_book() -> Value {
    json!({
        "isbn": "0691161518",
        "amazon_url": "http://a.co/eobPtX2",
        "author": "Matthew Lane",
        "language": "english",
        "pages": 264,
        "publisher": "Princeton University Press",
        "title": "Power-Up: Unlocking the Hidden Mathematics in Video Games",
        "year": 2017
    })
}

fn test_book_2() -> Value {
    let mut book = test_book();
    book["isbn"] = json!("032316967");
    book
}

fn writing_101() -> Value {
    json!({
        "isbn": "12345",
        "amazon_url": "http://amazon.com/123",
        "author": "Booker Page",
        "language": "english",
        "pages": 101,
        "publisher": "Penguin",
        "title": "Writing 101",
        "year": 1999
    })
}

#[tokio::test]
async fn list_returns_books_in_insertion_order() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [test_book(), test_book_2()] }));
}

#[tokio::test]
async fn list_filters_by_isbn() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(Method::GET, "/books?isbn=032316967", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "books": [test_book_2()] }));
}

#[tokio::test]
async fn list_with_repeated_isbn_filter_is_400() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(Method::GET, "/books?isbn=a&isbn=b", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(body["error"]["status"], 400);
}

#[tokio::test]
async fn get_returns_single_book() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(Method::GET, "/books/0691161518", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": test_book() }));
}

#[tokio::test]
async fn get_unknown_isbn_is_404() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(Method::GET, "/books/123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
}

#[tokio::test]
async fn create_get_delete_scenario() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::POST, "/books", Some(writing_101())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "book": writing_101() }));

    let (status, body) = app.send(Method::GET, "/books/12345", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": writing_101() }));

    let (status, body) = app.send(Method::DELETE, "/books/12345", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Book deleted" }));

    let (status, _) = app.send(Method::GET, "/books/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.row_count().await, 0);
}

#[tokio::test]
async fn duplicate_isbn_is_rejected_once() {
    let app = TestApp::seeded().await;

    let (status, body) = app.send(Method::POST, "/books", Some(test_book())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "Book with ISBN 0691161518 already exists"
    );
    assert_eq!(app.row_count().await, 2);
}

#[tokio::test]
async fn create_missing_required_fields_is_400() {
    let app = TestApp::new().await;

    let missing = json!({ "isbn": "12345", "author": "Writerman", "pages": 200 });
    let (status, body) = app.send(Method::POST, "/books", Some(missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"][0],
        "instance requires property \"amazon_url\""
    );
    assert_eq!(app.row_count().await, 0);
}

#[tokio::test]
async fn create_with_non_integer_pages_is_400() {
    let app = TestApp::new().await;

    let mut payload = writing_101();
    payload["pages"] = json!("two hundred");
    let (status, body) = app.send(Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        json!(["instance.pages is not of a type(s) integer"])
    );
    assert_eq!(app.row_count().await, 0);
}

#[tokio::test]
async fn create_accepts_integral_float_year() {
    let app = TestApp::new().await;

    let mut payload = writing_101();
    payload["year"] = json!(1999.0);
    let (status, body) = app.send(Method::POST, "/books", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "book": writing_101() }));
}

#[tokio::test]
async fn update_replaces_every_field() {
    let app = TestApp::seeded().await;

    let mut replacement = test_book();
    replacement["title"] = json!("Power-Up, Second Edition");
    replacement["pages"] = json!(300);
    replacement["year"] = json!(2020);
    replacement["language"] = json!("german");

    let (status, body) = app
        .send(Method::PUT, "/books/0691161518", Some(replacement.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "book": replacement.clone() }));

    let (_, body) = app.send(Method::GET, "/books/0691161518", None).await;
    assert_eq!(body, json!({ "book": replacement }));
}

#[tokio::test]
async fn update_with_body_isbn_renames_the_book() {
    let app = TestApp::seeded().await;

    let mut renamed = test_book();
    renamed["isbn"] = json!("9999999999");
    let (status, _) = app
        .send(Method::PUT, "/books/0691161518", Some(renamed.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::GET, "/books/0691161518", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = app.send(Method::GET, "/books/9999999999", None).await;
    assert_eq!(body, json!({ "book": renamed }));
}

#[tokio::test]
async fn invalid_update_leaves_row_untouched() {
    let app = TestApp::seeded().await;

    let partial = json!({ "title": "Only a title" });
    let (status, body) = app
        .send(Method::PUT, "/books/0691161518", Some(partial))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_array().unwrap().len() > 1);

    let (_, body) = app.send(Method::GET, "/books/0691161518", None).await;
    assert_eq!(body, json!({ "book": test_book() }));
}

#[tokio::test]
async fn update_unknown_isbn_is_404() {
    let app = TestApp::seeded().await;

    let (status, _) = app.send(Method::PUT, "/books/123", Some(writing_101())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.row_count().await, 2);

    let (status, _) = app.send(Method::GET, "/books/12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_isbn_is_404() {
    let app = TestApp::seeded().await;

    let (status, _) = app.send(Method::DELETE, "/books/123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.row_count().await, 2);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new().await;

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, spec) = app.send(Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"]["/books"]["post"].is_object());
    assert!(spec["paths"]["/books/{isbn}"]["delete"].is_object());
    assert_eq!(spec["components"]["schemas"]["Book"]["required"][0], "isbn");
}
