//! Browser sessions: key-value storage and the visit counter

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppResult;

/// Session key holding the number of index page visits
pub const NUM_VISITS_KEY: &str = "num_visits";

/// Session key holding the id of the logged-in user
pub const AUTH_USER_KEY: &str = "_auth_user_id";

/// Integer key-value storage scoped to one session
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str, key: &str) -> AppResult<Option<i64>>;
    async fn set(&self, session_id: &str, key: &str, value: i64) -> AppResult<()>;
    /// Add one to `key` and return the new value, starting from zero
    async fn incr(&self, session_id: &str, key: &str) -> AppResult<i64>;
    /// Whether the session holds any key
    async fn exists(&self, session_id: &str) -> AppResult<bool>;
    /// Move every key of `from` under `to`, leaving `from` empty
    async fn rename(&self, from: &str, to: &str) -> AppResult<()>;
    /// Drop every key of the session
    async fn flush(&self, session_id: &str) -> AppResult<()>;
}

/// Session store kept in process memory; sessions never expire
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, HashMap<String, i64>>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str, key: &str) -> AppResult<Option<i64>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).and_then(|s| s.get(key)).copied())
    }

    async fn set(&self, session_id: &str, key: &str, value: i64) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn incr(&self, session_id: &str, key: &str) -> AppResult<i64> {
        let mut sessions = self.sessions.write().await;
        let value = sessions
            .entry(session_id.to_string())
            .or_default()
            .entry(key.to_string())
            .or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn exists(&self, session_id: &str) -> AppResult<bool> {
        Ok(self.sessions.read().await.contains_key(session_id))
    }

    async fn rename(&self, from: &str, to: &str) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        if let Some(data) = sessions.remove(from) {
            sessions.insert(to.to_string(), data);
        }
        Ok(())
    }

    async fn flush(&self, session_id: &str) -> AppResult<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// Session of the current request, identified by the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }

    fn key(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Clone)]
pub struct SessionsService {
    store: Arc<dyn SessionStore>,
}

impl SessionsService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Count a visit and return the number of visits before this one
    pub async fn record_visit(&self, session: &Session) -> AppResult<i64> {
        let visits = self.store.incr(&session.key(), NUM_VISITS_KEY).await?;
        Ok(visits - 1)
    }

    /// Whether the store knows this session id
    pub async fn is_known(&self, session: &Session) -> AppResult<bool> {
        self.store.exists(&session.key()).await
    }

    /// Move the session data under a fresh id; the old id is left empty
    pub async fn cycle(&self, session: &Session) -> AppResult<Session> {
        let cycled = Session::new(Uuid::new_v4());
        self.store.rename(&session.key(), &cycled.key()).await?;
        Ok(cycled)
    }

    pub async fn user_id(&self, session: &Session) -> AppResult<Option<i32>> {
        let value = self.store.get(&session.key(), AUTH_USER_KEY).await?;
        Ok(value.and_then(|v| i32::try_from(v).ok()))
    }

    pub async fn log_in(&self, session: &Session, user_id: i32) -> AppResult<()> {
        self.store
            .set(&session.key(), AUTH_USER_KEY, i64::from(user_id))
            .await
    }

    pub async fn flush(&self, session: &Session) -> AppResult<()> {
        self.store.flush(&session.key()).await
    }
}
