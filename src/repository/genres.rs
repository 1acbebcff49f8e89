//! Genres and languages repositories

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::genre::{Genre, Language},
};

#[async_trait]
pub trait GenresRepository: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Genre>>;
    /// Ids from `ids` that match no genre
    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>>;
    async fn create(&self, name: &str) -> AppResult<Genre>;
}

#[async_trait]
pub trait LanguagesRepository: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Language>>;
    async fn get_by_id(&self, id: i32) -> AppResult<Language>;
    async fn create(&self, name: &str) -> AppResult<Language>;
}

#[derive(Clone)]
pub struct PgGenresRepository {
    pool: Pool<Postgres>,
}

impl PgGenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenresRepository for PgGenresRepository {
    async fn list_all(&self) -> AppResult<Vec<Genre>> {
        let rows = sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn missing_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let rows: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT wanted.id
            FROM UNNEST($1::int4[]) AS wanted(id)
            WHERE NOT EXISTS (SELECT 1 FROM genres g WHERE g.id = wanted.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create(&self, name: &str) -> AppResult<Genre> {
        let row = sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }
}

#[derive(Clone)]
pub struct PgLanguagesRepository {
    pool: Pool<Postgres>,
}

impl PgLanguagesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LanguagesRepository for PgLanguagesRepository {
    async fn list_all(&self) -> AppResult<Vec<Language>> {
        let rows = sqlx::query_as::<_, Language>("SELECT * FROM languages ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT * FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    async fn create(&self, name: &str) -> AppResult<Language> {
        let row =
            sqlx::query_as::<_, Language>("INSERT INTO languages (name) VALUES ($1) RETURNING *")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(row)
    }
}
