//! Author and book management behind permissions

use axum::http::StatusCode;
use serde_json::json;

use catalog_server::models::{book_instance::LoanStatus, user::Permission};

use crate::common::{isbn, TestApp};

#[tokio::test]
async fn test_author_crud() {
    let mut app = TestApp::new();
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;

    let form = app.get("/catalog/author/create").await;
    assert_eq!(form.status, StatusCode::OK);
    assert_eq!(form.body["first_name"], "");

    let response = app
        .post(
            "/catalog/author/create",
            json!({ "first_name": "Octavia", "last_name": "Butler", "date_of_birth": "1947-06-22" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location.unwrap();
    assert!(location.starts_with("/catalog/authors/"));
    let id: i32 = location.trim_start_matches("/catalog/authors/").parse().unwrap();

    let response = app
        .post(
            &format!("/catalog/author/{}/update", id),
            json!({ "first_name": "Octavia E.", "last_name": "Butler", "date_of_death": "2006-02-24" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let detail = app.get(&location).await;
    assert_eq!(detail.body["full_name"], "Butler, Octavia E.");
    assert_eq!(detail.body["date_of_death"], "2006-02-24");

    let confirm = app.get(&format!("/catalog/author/{}/delete", id)).await;
    assert_eq!(confirm.status, StatusCode::OK);

    let response = app
        .post(&format!("/catalog/author/{}/delete", id), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog/authors/"));
    assert_eq!(app.get(&location).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_author_form_validation() {
    let mut app = TestApp::new();
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;

    let response = app
        .post(
            "/catalog/author/create",
            json!({ "first_name": "", "last_name": "x".repeat(101) }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["fields"]["first_name"].is_array());
    assert!(response.body["fields"]["last_name"].is_array());
}

#[tokio::test]
async fn test_author_management_requires_permission() {
    let mut app = TestApp::new();
    app.login_as("bookkeeper", &[Permission::CanAddBook]).await;

    let response = app
        .post(
            "/catalog/author/create",
            json!({ "first_name": "Octavia", "last_name": "Butler" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.get("/catalog/authors/").await.body["total"], 0);
}

#[tokio::test]
async fn test_deleting_author_keeps_books() {
    let mut app = TestApp::new();
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let book = app.book("Kindred", &isbn(1)).await;
    let author_id = book.author_id.unwrap();

    let response = app
        .post(&format!("/catalog/author/{}/delete", author_id), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let detail = app.get(&format!("/catalog/books/{}", book.id)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["author_id"], json!(null));
    assert_eq!(detail.body["author"], json!(null));
}

#[tokio::test]
async fn test_book_crud() {
    let mut app = TestApp::new();
    app.login_as("bookkeeper", &[Permission::CanAddBook]).await;
    let author = app.author("Octavia", "Butler").await;
    let language = app.language("English").await;
    let fiction = app.genre("Fiction").await;
    let scifi = app.genre("Science fiction").await;

    let form = app.get("/catalog/book/create").await;
    assert_eq!(form.status, StatusCode::OK);
    assert_eq!(form.body["choices"]["authors"][0]["last_name"], "Butler");
    assert_eq!(form.body["choices"]["genres"].as_array().unwrap().len(), 2);
    assert_eq!(form.body["choices"]["languages"][0]["name"], "English");

    let response = app
        .post(
            "/catalog/book/create",
            json!({
                "title": "Parable of the Sower",
                "summary": "California, 2024.",
                "isbn": isbn(1),
                "author_id": author.id,
                "language_id": language.id,
                "genre_ids": [scifi.id, fiction.id]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location.unwrap();
    let id: i32 = location.trim_start_matches("/catalog/books/").parse().unwrap();

    let edit = app.get(&format!("/catalog/book/{}/update", id)).await;
    assert_eq!(edit.body["form"]["title"], "Parable of the Sower");
    assert_eq!(edit.body["form"]["genre_ids"].as_array().unwrap().len(), 2);

    let response = app
        .post(
            &format!("/catalog/book/{}/update", id),
            json!({
                "title": "Parable of the Talents",
                "summary": "The sequel.",
                "isbn": isbn(2),
                "author_id": author.id,
                "language_id": language.id,
                "genre_ids": [scifi.id]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let detail = app.get(&location).await.body;
    assert_eq!(detail["title"], "Parable of the Talents");
    assert_eq!(detail["display_genre"], "Science fiction");

    let response = app
        .post(&format!("/catalog/book/{}/delete", id), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog/books/"));
    assert_eq!(app.get(&location).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_book_genre_picked_twice_is_stored_once() {
    let mut app = TestApp::new();
    app.login_as("bookkeeper", &[Permission::CanAddBook]).await;
    let author = app.author("Octavia", "Butler").await;
    let language = app.language("English").await;
    let fiction = app.genre("Fiction").await;
    let scifi = app.genre("Science fiction").await;

    let response = app
        .post(
            "/catalog/book/create",
            json!({
                "title": "Kindred",
                "summary": "Maryland, 1815.",
                "isbn": isbn(1),
                "author_id": author.id,
                "language_id": language.id,
                "genre_ids": [fiction.id, fiction.id]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location.unwrap();

    let detail = app.get(&location).await.body;
    assert_eq!(detail["display_genre"], "Fiction");
    assert_eq!(detail["genres"].as_array().unwrap().len(), 1);

    let response = app
        .post(
            &format!("{}/update", location.replace("/books/", "/book/")),
            json!({
                "title": "Kindred",
                "summary": "Maryland, 1815.",
                "isbn": isbn(1),
                "author_id": author.id,
                "language_id": language.id,
                "genre_ids": [scifi.id, fiction.id, scifi.id]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let detail = app.get(&location).await.body;
    assert_eq!(detail["genres"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_book_form_requires_relations() {
    let mut app = TestApp::new();
    app.login_as("bookkeeper", &[Permission::CanAddBook]).await;

    let response = app
        .post(
            "/catalog/book/create",
            json!({
                "title": "Orphan",
                "summary": "Nobody wrote it.",
                "isbn": "123"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let fields = &response.body["fields"];
    assert!(fields["isbn"].is_array());
    assert!(fields["author_id"].is_array());
    assert!(fields["language_id"].is_array());
    assert!(fields["genre_ids"].is_array());
}

#[tokio::test]
async fn test_duplicate_isbn_is_conflict() {
    let mut app = TestApp::new();
    app.login_as("bookkeeper", &[Permission::CanAddBook]).await;
    let existing = app.book("Kindred", &isbn(1)).await;

    let response = app
        .post(
            "/catalog/book/create",
            json!({
                "title": "Another Kindred",
                "summary": "Same ISBN.",
                "isbn": existing.isbn,
                "author_id": existing.author_id,
                "language_id": existing.language_id,
                "genre_ids": [1]
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "Duplicate");
}

#[tokio::test]
async fn test_deleting_book_with_copies_is_conflict() {
    let mut app = TestApp::new();
    app.login_as("bookkeeper", &[Permission::CanAddBook]).await;
    let book = app.book("Kindred", &isbn(1)).await;
    app.instance(&book, LoanStatus::Available, None, None).await;

    let response = app
        .post(&format!("/catalog/book/{}/delete", book.id), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "Conflict");

    assert_eq!(
        app.get(&format!("/catalog/books/{}", book.id)).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_book_management_requires_permission() {
    let mut app = TestApp::new();
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let book = app.book("Kindred", &isbn(1)).await;

    assert_eq!(app.get("/catalog/book/create").await.status, StatusCode::FORBIDDEN);
    let response = app
        .post(&format!("/catalog/book/{}/delete", book.id), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
