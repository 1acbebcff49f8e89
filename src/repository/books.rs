//! Books repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookForm, BookListEntry},
        genre::Genre,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BooksRepository: Send + Sync {
    async fn count(&self) -> AppResult<i64>;
    /// Count books whose title contains `fragment`, ignoring case
    async fn count_title_contains(&self, fragment: &str) -> AppResult<i64>;
    /// One page of books ordered by title
    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<BookListEntry>>;
    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookListEntry>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Book>;
    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>>;
    async fn create(&self, data: &BookForm) -> AppResult<Book>;
    async fn update(&self, id: i32, data: &BookForm) -> AppResult<Book>;
    /// Delete a book; refused while copies of it exist
    async fn delete(&self, id: i32) -> AppResult<()>;
}

const LIST_SELECT: &str = r#"
    SELECT b.id, b.title, b.author_id,
           a.last_name || ', ' || a.first_name AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_title_contains(&self, fragment: &str) -> AppResult<i64> {
        let pattern = format!(
            "%{}%",
            fragment.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE title ILIKE $1")
            .bind(pattern)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<BookListEntry>> {
        let query = format!("{} ORDER BY b.title, b.id LIMIT $1 OFFSET $2", LIST_SELECT);
        let rows = sqlx::query_as::<_, BookListEntry>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookListEntry>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.title, b.id", LIST_SELECT);
        let rows = sqlx::query_as::<_, BookListEntry>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, data: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(data.language_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[])")
            .bind(book.id)
            .bind(data.genre_ids.as_slice())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }

    async fn update(&self, id: i32, data: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, summary = $2, isbn = $3, author_id = $4, language_id = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(data.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO book_genres (book_id, genre_id) SELECT $1, UNNEST($2::int4[])")
            .bind(id)
            .bind(data.genre_ids.as_slice())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        // book_instances.book_id is ON DELETE RESTRICT
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict(format!("Book with id {} still has copies", id))
                }
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
