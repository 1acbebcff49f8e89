//! User model, permissions and account forms

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Named capability granted to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Manage loans and authors ("Set book as returned")
    CanMarkReturned,
    /// Manage books ("Can add new book")
    CanAddBook,
}

impl Permission {
    pub fn codename(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "can_mark_returned",
            Permission::CanAddBook => "can_add_book",
        }
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "can_mark_returned" => Ok(Permission::CanMarkReturned),
            "can_add_book" => Ok(Permission::CanAddBook),
            _ => Err(format!("Unknown permission: {}", s)),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.codename())
    }
}

/// User row from database (without permissions)
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Stored credentials used to authenticate a login
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub password_hash: String,
}

/// Authenticated user with their permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub permissions: Vec<Permission>,
}

impl User {
    pub fn from_row(row: UserRow, permissions: Vec<Permission>) -> Self {
        Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            permissions,
        }
    }

    pub fn has_perm(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    // Authorization checks
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_perm(permission) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Missing permission {}",
                permission.codename()
            )))
        }
    }

    pub fn require_mark_returned(&self) -> Result<(), AppError> {
        self.require(Permission::CanMarkReturned)
    }

    pub fn require_add_book(&self) -> Result<(), AppError> {
        self.require(Permission::CanAddBook)
    }
}

/// Data for inserting a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Local path to go to after login
    pub next: Option<String>,
}

/// Signup request
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[validate(schema(function = "validate_password_confirmation", skip_on_field_errors = false))]
pub struct SignupForm {
    #[validate(
        length(min = 3, max = 150, message = "Username must have between 3 and 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if username.chars().all(allowed) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username");
        err.message = Some("Letters, digits and @/./+/-/_ only.".into());
        Err(err)
    }
}

fn validate_password_confirmation(form: &SignupForm) -> Result<(), ValidationError> {
    if form.password == form.password_confirm {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_mismatch");
        err.message = Some("The two password fields didn't match.".into());
        Err(err)
    }
}
