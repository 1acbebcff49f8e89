//! Book instances (copies) repository

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, CreateBookInstance, LoanEntry, LoanStatus},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InstancesRepository: Send + Sync {
    async fn count(&self) -> AppResult<i64>;
    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64>;
    async fn count_for_book(&self, book_id: i32) -> AppResult<i64>;
    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance>;
    /// On-loan copies ordered by due date, optionally restricted to one borrower
    async fn list_on_loan(&self, borrower_id: Option<i32>) -> AppResult<Vec<LoanEntry>>;
    async fn create(&self, data: &CreateBookInstance) -> AppResult<BookInstance>;
    async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance>;
    /// Make a copy available again, clearing due date and borrower
    async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstance>;
}

#[derive(Clone)]
pub struct PgInstancesRepository {
    pool: Pool<Postgres>,
}

impl PgInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book instance {} not found", id))
}

#[async_trait]
impl InstancesRepository for PgInstancesRepository {
    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_for_book(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE book_id = $1")
                .bind(book_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let rows = sqlx::query_as::<_, BookInstance>(
            "SELECT * FROM book_instances WHERE book_id = $1 ORDER BY due_back, id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn list_on_loan(&self, borrower_id: Option<i32>) -> AppResult<Vec<LoanEntry>> {
        let rows = sqlx::query_as::<_, LoanEntry>(
            r#"
            SELECT bi.id, bi.book_id, b.title, bi.imprint, bi.due_back, bi.status,
                   bi.borrower_id, u.username AS borrower_username
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN users u ON u.id = bi.borrower_id
            WHERE bi.status = $1
              AND ($2::int4 IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back ASC NULLS LAST, bi.id
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, data: &CreateBookInstance) -> AppResult<BookInstance> {
        let row = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.status)
        .bind(data.borrower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "UPDATE book_instances SET due_back = $1 WHERE id = $2 RETURNING *",
        )
        .bind(due_back)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn mark_returned(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET status = $1, due_back = NULL, borrower_id = NULL
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Available)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }
}
