//! Accounts: signup, login and the user behind a session

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, NewUser, Permission, SignupForm, User},
    repository::Repository,
};

use super::sessions::{Session, SessionsService};

/// Where a login without a usable `next` lands
pub const LOGIN_REDIRECT_URL: &str = "/catalog/";

const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Outcome of a successful login
#[derive(Debug)]
pub struct LoggedIn {
    pub user: User,
    /// The session under its new id; the id sent with the login request is dropped
    pub session: Session,
    /// Local path to continue to
    pub next: String,
}

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
    sessions: SessionsService,
}

impl AccountsService {
    pub fn new(repository: Repository, sessions: SessionsService) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// User logged into `session`, if any.
    ///
    /// A session pointing at a user that no longer exists is treated as anonymous.
    pub async fn current_user(&self, session: &Session) -> AppResult<Option<User>> {
        let Some(user_id) = self.sessions.user_id(session).await? else {
            return Ok(None);
        };
        match self.repository.users.get_by_id(user_id).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check credentials, move the session to a fresh id and attach the user to it
    pub async fn login(&self, session: &Session, form: LoginForm) -> AppResult<LoggedIn> {
        let credentials = self
            .repository
            .users
            .get_credentials(&form.username)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_LOGIN.to_string()))?;

        if !self.verify_password(&credentials.password_hash, &form.password)? {
            tracing::warn!("Failed login for {}", form.username);
            return Err(AppError::Authentication(INVALID_LOGIN.to_string()));
        }

        let user = self.repository.users.get_by_id(credentials.id).await?;
        let session = self.sessions.cycle(session).await?;
        self.sessions.log_in(&session, user.id).await?;
        tracing::info!("User {} logged in", user.username);

        Ok(LoggedIn {
            user,
            session,
            next: safe_next(form.next.as_deref()),
        })
    }

    pub async fn logout(&self, session: &Session) -> AppResult<()> {
        self.sessions.flush(session).await
    }

    /// Create an account without any permission
    pub async fn signup(&self, form: SignupForm) -> AppResult<User> {
        form.validate()?;

        let new_user = NewUser {
            password_hash: self.hash_password(&form.password)?,
            username: form.username,
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email.unwrap_or_default(),
        };
        let user = self.repository.users.create(&new_user).await?;
        tracing::info!("Created user {} (id={})", user.username, user.id);
        Ok(user)
    }

    pub async fn grant_permission(&self, user_id: i32, permission: Permission) -> AppResult<()> {
        self.repository.users.grant_permission(user_id, permission).await
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_password(&self, hash: &str, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Only local absolute paths are followed after login
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => LOGIN_REDIRECT_URL.to_string(),
    }
}
