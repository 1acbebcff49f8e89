//! Public catalog pages, sessions and access control

use axum::http::StatusCode;
use serde_json::json;

use catalog_server::models::{book_instance::LoanStatus, user::Permission};

use crate::common::{isbn, TestApp};

#[tokio::test]
async fn test_health_check() {
    let mut app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");

    let response = app.get("/ready").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ready");
}

#[tokio::test]
async fn test_root_redirects_to_catalog() {
    let mut app = TestApp::new();

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.location.as_deref(), Some("/catalog/"));
}

#[tokio::test]
async fn test_index_counts_visits_per_session() {
    let mut app = TestApp::new();

    for expected in 0..3 {
        let response = app.get("/catalog/").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["num_visits"], expected);
    }

    // A different browser starts from zero
    let mut other = TestApp::new();
    assert_eq!(other.get("/catalog/").await.body["num_visits"], 0);
}

#[tokio::test]
async fn test_index_counts() {
    let mut app = TestApp::new();
    let dune = app.book("Dune", &isbn(1)).await;
    let wind = app.book("The Name OF the Wind", &isbn(2)).await;
    app.book("Children of Time", &isbn(3)).await;

    app.instance(&dune, LoanStatus::Available, None, None).await;
    app.instance(&dune, LoanStatus::Maintenance, None, None).await;
    app.instance(&wind, LoanStatus::Available, None, None).await;

    let body = app.get("/catalog/").await.body;
    assert_eq!(body["num_books"], 3);
    assert_eq!(body["num_instances"], 3);
    assert_eq!(body["num_instances_available"], 2);
    assert_eq!(body["num_authors"], 3);
    assert_eq!(body["num_books_title_contains"], 2);
}

#[tokio::test]
async fn test_book_list_paginates_by_ten() {
    let mut app = TestApp::new();
    let author = app.author("Isaac", "Asimov").await;
    let language = app.language("English").await;
    let genre = app.genre("Science fiction").await;
    for n in 0..15 {
        let form = crate::common::book_form(
            &format!("Foundation {:02}", n),
            &isbn(n),
            &author,
            &language,
            &[genre.id],
        );
        app.repository.books.create(&form).await.unwrap();
    }

    let first = app.get("/catalog/books/").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["items"].as_array().unwrap().len(), 10);
    assert_eq!(first.body["total"], 15);
    assert_eq!(first.body["num_pages"], 2);
    assert_eq!(first.body["has_next"], true);
    assert_eq!(first.body["items"][0]["title"], "Foundation 00");
    assert_eq!(first.body["items"][0]["author_name"], "Asimov, Isaac");

    let second = app.get("/catalog/books/?page=2").await;
    assert_eq!(second.body["items"].as_array().unwrap().len(), 5);
    assert_eq!(second.body["has_previous"], true);
    assert_eq!(second.body["has_next"], false);

    assert_eq!(app.get("/catalog/books/?page=3").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/catalog/books/?page=0").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_author_list_has_one_page() {
    let mut app = TestApp::new();

    let response = app.get("/catalog/authors/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["items"], json!([]));
    assert_eq!(response.body["num_pages"], 1);
}

#[tokio::test]
async fn test_author_list_ordered_by_name() {
    let mut app = TestApp::new();
    app.author("Ursula", "Le Guin").await;
    app.author("Iain", "Banks").await;
    app.author("Anne", "Le Guin").await;

    let body = app.get("/catalog/authors/").await.body;
    let names: Vec<String> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| format!("{} {}", a["first_name"].as_str().unwrap(), a["last_name"].as_str().unwrap()))
        .collect();
    assert_eq!(names, vec!["Iain Banks", "Anne Le Guin", "Ursula Le Guin"]);
}

#[tokio::test]
async fn test_book_detail() {
    let mut app = TestApp::new();
    let book = app.book("Dune", &isbn(1)).await;
    app.instance(&book, LoanStatus::Available, None, None).await;

    let response = app.get(&format!("/catalog/books/{}", book.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Dune");
    assert_eq!(response.body["isbn"], isbn(1));
    assert_eq!(response.body["display_genre"], "Fiction");
    assert_eq!(response.body["language"]["name"], "English");
    assert_eq!(response.body["instances"][0]["status"], "available");

    assert_eq!(app.get("/catalog/books/9999").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_author_detail_lists_books() {
    let mut app = TestApp::new();
    let book = app.book("Dune", &isbn(1)).await;
    let author_id = book.author_id.unwrap();

    let response = app.get(&format!("/catalog/authors/{}", author_id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["full_name"], "Dune, Test");
    assert_eq!(response.body["books"][0]["title"], "Dune");

    assert_eq!(app.get("/catalog/authors/9999").await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    let mut app = TestApp::new();

    let response = app.get("/catalog/mybooks/").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(
        response.location.as_deref(),
        Some("/accounts/login/?next=%2Fcatalog%2Fmybooks%2F")
    );

    let response = app.post("/catalog/author/create", json!({})).await;
    assert_eq!(response.status, StatusCode::FOUND);
}

#[tokio::test]
async fn test_login_returns_to_next() {
    let mut app = TestApp::new();
    app.create_user("reader", &[]).await;

    let response = app
        .post(
            "/accounts/login/",
            json!({
                "username": "reader",
                "password": crate::common::PASSWORD,
                "next": "/catalog/mybooks/"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/catalog/mybooks/"));

    assert_eq!(app.get("/catalog/mybooks/").await.status, StatusCode::OK);

    let response = app.post("/accounts/logout/", json!({})).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(app.get("/catalog/mybooks/").await.status, StatusCode::FOUND);
}

#[tokio::test]
async fn test_login_moves_session_to_new_cookie() {
    let mut app = TestApp::new();
    let planted = "sessionid=11111111-1111-1111-1111-111111111111".to_string();
    app.cookie = Some(planted.clone());

    // A session id the server never issued is replaced
    assert_eq!(app.get("/catalog/").await.body["num_visits"], 0);
    let anonymous = app.cookie.clone().unwrap();
    assert_ne!(anonymous, planted);
    assert_eq!(app.get("/catalog/").await.body["num_visits"], 1);

    app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let logged_in = app.cookie.clone().unwrap();
    assert_ne!(logged_in, anonymous);
    assert_eq!(app.get("/catalog/borrowed/").await.status, StatusCode::OK);
    // Session data follows the new id
    assert_eq!(app.get("/catalog/").await.body["num_visits"], 2);

    for stale in [planted, anonymous] {
        app.cookie = Some(stale);
        assert_eq!(app.get("/catalog/borrowed/").await.status, StatusCode::FOUND);
    }
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let mut app = TestApp::new();
    app.create_user("reader", &[]).await;

    let response = app
        .post("/accounts/login/", json!({ "username": "reader", "password": "wrong" }))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "NotAuthenticated");
}

#[tokio::test]
async fn test_signup() {
    let mut app = TestApp::new();

    let form = json!({
        "username": "newcomer",
        "password": "long enough",
        "password_confirm": "long enough"
    });
    let response = app.post("/accounts/signup/", form.clone()).await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["username"], "newcomer");
    assert_eq!(response.body["permissions"], json!([]));

    let response = app.post("/accounts/signup/", form).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = app
        .post(
            "/accounts/signup/",
            json!({ "username": "other", "password": "long enough", "password_confirm": "different" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_borrowed_requires_permission() {
    let mut patron = TestApp::new();
    patron.login_as("patron", &[]).await;
    assert_eq!(patron.get("/catalog/borrowed/").await.status, StatusCode::FORBIDDEN);

    let mut librarian = TestApp::new();
    librarian
        .login_as("librarian", &[Permission::CanMarkReturned])
        .await;
    assert_eq!(librarian.get("/catalog/borrowed/").await.status, StatusCode::OK);
}
