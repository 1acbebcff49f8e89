//! Users repository

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{NewUser, Permission, User, UserCredentials, UserRow},
};

#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// User with their permissions
    async fn get_by_id(&self, id: i32) -> AppResult<User>;
    async fn get_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>>;
    async fn create(&self, data: &NewUser) -> AppResult<User>;
    async fn grant_permission(&self, user_id: i32, permission: Permission) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgUsersRepository {
    pool: Pool<Postgres>,
}

impl PgUsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn permissions_of(&self, user_id: i32) -> AppResult<Vec<Permission>> {
        let codenames: Vec<String> = sqlx::query_scalar(
            "SELECT codename FROM user_permissions WHERE user_id = $1 ORDER BY codename",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        // Codenames this server does not know about are ignored
        Ok(codenames.iter().filter_map(|c| c.parse().ok()).collect())
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, first_name, last_name, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        let permissions = self.permissions_of(id).await?;
        Ok(User::from_row(row, permissions))
    }

    async fn get_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create(&self, data: &NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, first_name, last_name, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, first_name, last_name, email
            "#,
        )
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(User::from_row(row, Vec::new()))
    }

    async fn grant_permission(&self, user_id: i32, permission: Permission) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO user_permissions (user_id, codename) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(permission.codename())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
