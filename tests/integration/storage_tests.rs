//! Postgres and Redis backends against live servers.
//!
//! Run with `cargo test -- --ignored` and `DATABASE_URL`/`REDIS_URL` set.

use chrono::NaiveDate;
use sqlx::PgPool;

use catalog_server::{
    error::AppError,
    models::{
        author::AuthorForm,
        book_instance::{CreateBookInstance, LoanStatus},
    },
    repository::Repository,
    services::{redis::RedisSessionStore, sessions::SessionStore},
};

use crate::common::{book_form, isbn};

async fn seeded_book(repository: &Repository, n: u32) -> catalog_server::models::book::Book {
    let author = repository
        .authors
        .create(&AuthorForm {
            first_name: "Octavia".into(),
            last_name: "Butler".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let language = repository.languages.create(&format!("English {}", n)).await.unwrap();
    let fiction = repository.genres.create(&format!("Fiction {}", n)).await.unwrap();
    let scifi = repository.genres.create(&format!("Science fiction {}", n)).await.unwrap();
    repository
        .books
        .create(&book_form("Kindred", &isbn(n), &author, &language, &[fiction.id, scifi.id]))
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn test_pg_book_genres_and_unique_isbn(pool: PgPool) {
    let repository = Repository::new(pool);
    let book = seeded_book(&repository, 1).await;

    let genres = repository.books.genres_of(book.id).await.unwrap();
    assert_eq!(genres.len(), 2);

    let author = repository.authors.get_by_id(book.author_id.unwrap()).await.unwrap();
    let language = repository.languages.get_by_id(book.language_id.unwrap()).await.unwrap();
    let result = repository
        .books
        .create(&book_form("Copycat", &isbn(1), &author, &language, &[]))
        .await;
    match result {
        Err(AppError::Duplicate(message)) => {
            assert_eq!(message, "Book with this ISBN already exists.")
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a Postgres server at DATABASE_URL"]
async fn test_pg_book_with_copies_cannot_be_deleted(pool: PgPool) {
    let repository = Repository::new(pool);
    let book = seeded_book(&repository, 2).await;
    let due = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

    let copy = repository
        .instances
        .create(&CreateBookInstance {
            book_id: book.id,
            imprint: "Doubleday, 1979".into(),
            due_back: Some(due),
            status: LoanStatus::OnLoan,
            borrower_id: None,
        })
        .await
        .unwrap();

    // Status survives the one-letter column
    let stored = repository.instances.get_by_id(copy.id).await.unwrap();
    assert_eq!(stored.status, LoanStatus::OnLoan);
    assert_eq!(stored.due_back, Some(due));

    let result = repository.books.delete(book.id).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(repository.books.get_by_id(book.id).await.is_ok());
}

#[tokio::test]
#[ignore = "needs a Redis server at REDIS_URL"]
async fn test_redis_session_store() {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    let store = RedisSessionStore::new(&url, 60).await.unwrap();
    let id = uuid::Uuid::new_v4().to_string();
    let moved = uuid::Uuid::new_v4().to_string();

    assert!(!store.exists(&id).await.unwrap());
    assert_eq!(store.incr(&id, "num_visits").await.unwrap(), 1);
    assert_eq!(store.incr(&id, "num_visits").await.unwrap(), 2);
    store.set(&id, "_auth_user_id", 7).await.unwrap();

    store.rename(&id, &moved).await.unwrap();
    assert!(!store.exists(&id).await.unwrap());
    assert_eq!(store.get(&moved, "_auth_user_id").await.unwrap(), Some(7));
    assert_eq!(store.get(&moved, "num_visits").await.unwrap(), Some(2));

    // Renaming a missing session is a no-op
    store.rename(&id, &moved).await.unwrap();
    assert!(store.exists(&moved).await.unwrap());

    store.flush(&moved).await.unwrap();
    assert!(!store.exists(&moved).await.unwrap());
}
