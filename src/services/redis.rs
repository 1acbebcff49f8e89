//! Redis-backed session store

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

use super::sessions::SessionStore;

/// Each session is one Redis hash `session:{id}` whose TTL is refreshed on write
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Create a new Redis session store
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Session(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }

    /// Refresh the expiry of a session hash
    async fn touch(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        redis_key: &str,
    ) -> AppResult<()> {
        redis::cmd("EXPIRE")
            .arg(redis_key)
            .arg(self.ttl_seconds)
            .query_async::<_, ()>(conn)
            .await
            .map_err(|e| AppError::Session(format!("Failed to refresh session expiry: {}", e)))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session_id: &str, key: &str) -> AppResult<Option<i64>> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = conn
            .hget(Self::key(session_id), key)
            .await
            .map_err(|e| AppError::Session(format!("Failed to read session: {}", e)))?;
        Ok(value)
    }

    async fn set(&self, session_id: &str, key: &str, value: i64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let redis_key = Self::key(session_id);

        conn.hset::<_, _, _, ()>(&redis_key, key, value)
            .await
            .map_err(|e| AppError::Session(format!("Failed to write session: {}", e)))?;
        self.touch(&mut conn, &redis_key).await
    }

    async fn incr(&self, session_id: &str, key: &str) -> AppResult<i64> {
        let mut conn = self.connection().await?;
        let redis_key = Self::key(session_id);

        let value: i64 = conn
            .hincr(&redis_key, key, 1)
            .await
            .map_err(|e| AppError::Session(format!("Failed to write session: {}", e)))?;
        self.touch(&mut conn, &redis_key).await?;

        Ok(value)
    }

    async fn exists(&self, session_id: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        conn.exists(Self::key(session_id))
            .await
            .map_err(|e| AppError::Session(format!("Failed to read session: {}", e)))
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let from_key = Self::key(from);

        // RENAME fails on a missing source key
        let exists: bool = conn
            .exists(&from_key)
            .await
            .map_err(|e| AppError::Session(format!("Failed to read session: {}", e)))?;
        if !exists {
            return Ok(());
        }

        conn.rename::<_, _, ()>(&from_key, Self::key(to))
            .await
            .map_err(|e| AppError::Session(format!("Failed to rename session: {}", e)))?;
        Ok(())
    }

    async fn flush(&self, session_id: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(Self::key(session_id))
            .await
            .map_err(|e| AppError::Session(format!("Failed to delete session: {}", e)))?;
        Ok(())
    }
}
