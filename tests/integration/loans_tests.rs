//! Loan lists, renewals and returns

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use catalog_server::{
    models::{book_instance::LoanStatus, user::Permission},
    rules,
};

use crate::common::{isbn, TestApp};

#[tokio::test]
async fn test_my_loans_only_lists_own_on_loan_copies() {
    let mut app = TestApp::new();
    let today = rules::today();
    let me = app.login_as("reader", &[]).await;
    let someone_else = app.create_user("other", &[]).await;
    let book = app.book("Dune", &isbn(1)).await;

    let later = app
        .instance(&book, LoanStatus::OnLoan, Some(today + Duration::days(10)), Some(&me))
        .await;
    let sooner = app
        .instance(&book, LoanStatus::OnLoan, Some(today - Duration::days(2)), Some(&me))
        .await;
    app.instance(&book, LoanStatus::OnLoan, Some(today), Some(&someone_else))
        .await;
    app.instance(&book, LoanStatus::Reserved, Some(today), Some(&me))
        .await;

    let response = app.get("/catalog/mybooks/").await;
    assert_eq!(response.status, StatusCode::OK);

    let loans = response.body.as_array().unwrap();
    let ids: Vec<&str> = loans.iter().map(|l| l["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![sooner.id.to_string(), later.id.to_string()]);
    assert_eq!(loans[0]["is_overdue"], true);
    assert_eq!(loans[1]["is_overdue"], false);
    assert!(loans.iter().all(|l| l["borrower_id"] == me.id));
}

#[tokio::test]
async fn test_all_loans_lists_every_borrower() {
    let mut app = TestApp::new();
    let today = rules::today();
    let librarian = app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let reader = app.create_user("reader", &[]).await;
    let book = app.book("Dune", &isbn(1)).await;

    app.instance(&book, LoanStatus::OnLoan, Some(today + Duration::days(5)), Some(&reader))
        .await;
    app.instance(&book, LoanStatus::OnLoan, Some(today + Duration::days(1)), Some(&librarian))
        .await;
    app.instance(&book, LoanStatus::Available, None, None).await;

    let response = app.get("/catalog/borrowed/").await;
    assert_eq!(response.status, StatusCode::OK);

    let loans = response.body.as_array().unwrap();
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0]["borrower_username"], "librarian");
    assert_eq!(loans[1]["borrower_username"], "reader");
    assert!(loans.iter().all(|l| l["status"] == "on-loan"));
}

#[tokio::test]
async fn test_renewal_form_proposes_three_weeks() {
    let mut app = TestApp::new();
    let today = rules::today();
    let reader = app.create_user("reader", &[]).await;
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", &isbn(1)).await;
    let copy = app
        .instance(&book, LoanStatus::OnLoan, Some(today), Some(&reader))
        .await;

    let response = app.get(&format!("/catalog/book/{}/renew", copy.id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Dune");
    assert_eq!(
        response.body["due_back"],
        (today + Duration::weeks(3)).to_string()
    );
}

#[tokio::test]
async fn test_renewal_window() {
    let mut app = TestApp::new();
    let today = rules::today();
    let reader = app.create_user("reader", &[]).await;
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", &isbn(1)).await;
    let copy = app
        .instance(&book, LoanStatus::OnLoan, Some(today), Some(&reader))
        .await;
    let path = format!("/catalog/book/{}/renew", copy.id);

    let response = app
        .post(&path, json!({ "due_back": (today - Duration::days(1)).to_string() }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["fields"]["due_back"][0],
        "Invalid date - renewal date in the past"
    );

    let response = app
        .post(&path, json!({ "due_back": (today + Duration::days(29)).to_string() }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["fields"]["due_back"][0],
        "Invalid date - renewal date more than 4 weeks away."
    );

    // Rejected dates are not saved
    let stored = app.repository.instances.get_by_id(copy.id).await.unwrap();
    assert_eq!(stored.due_back, Some(today));

    for accepted in [today, today + Duration::days(28)] {
        let response = app
            .post(&path, json!({ "due_back": accepted.to_string() }))
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location.as_deref(), Some("/catalog/borrowed/"));

        let stored = app.repository.instances.get_by_id(copy.id).await.unwrap();
        assert_eq!(stored.due_back, Some(accepted));
    }
}

#[tokio::test]
async fn test_renewal_requires_permission() {
    let mut app = TestApp::new();
    let reader = app.login_as("reader", &[]).await;
    let book = app.book("Dune", &isbn(1)).await;
    let copy = app
        .instance(&book, LoanStatus::OnLoan, Some(rules::today()), Some(&reader))
        .await;

    let path = format!("/catalog/book/{}/renew", copy.id);
    assert_eq!(app.get(&path).await.status, StatusCode::FORBIDDEN);

    let response = app
        .post(&path, json!({ "due_back": rules::today().to_string() }))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_renewing_copy_not_on_loan_is_conflict() {
    let mut app = TestApp::new();
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", &isbn(1)).await;
    let copy = app.instance(&book, LoanStatus::Maintenance, None, None).await;

    let response = app
        .post(
            &format!("/catalog/book/{}/renew", copy.id),
            json!({ "due_back": rules::today().to_string() }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let stored = app.repository.instances.get_by_id(copy.id).await.unwrap();
    assert_eq!(stored.due_back, None);
}

#[tokio::test]
async fn test_renew_unknown_copy() {
    let mut app = TestApp::new();
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;

    let path = format!("/catalog/book/{}/renew", uuid::Uuid::new_v4());
    assert_eq!(app.get(&path).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mark_returned() {
    let mut app = TestApp::new();
    let reader = app.create_user("reader", &[]).await;
    app.login_as("librarian", &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", &isbn(1)).await;
    let copy = app
        .instance(&book, LoanStatus::OnLoan, Some(rules::today()), Some(&reader))
        .await;

    let response = app
        .post(&format!("/catalog/book/{}/return", copy.id), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let stored = app.repository.instances.get_by_id(copy.id).await.unwrap();
    assert_eq!(stored.status, LoanStatus::Available);
    assert_eq!(stored.due_back, None);
    assert_eq!(stored.borrower_id, None);

    let loans = app.get("/catalog/borrowed/").await.body;
    assert_eq!(loans, json!([]));
}
