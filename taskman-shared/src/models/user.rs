/// User model
///
/// Users sign in with email and password, create tasks and may be assigned
/// as their executor.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     first_name VARCHAR(255) NOT NULL,
///     last_name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_digest VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, EntityKind};

/// A user account
///
/// The password digest is an Argon2id PHC string and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    pub first_name: String,

    pub last_name: String,

    /// Stored trimmed and lower-cased; unique across all users
    pub email: String,

    #[serde(skip_serializing)]
    pub password_digest: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "First Last", used wherever a user is shown in a list
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name(),
        }
    }
}

impl Entity for User {
    type New = NewUser;
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> i64 {
        self.id
    }
}

/// The slice of a user that task views need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub full_name: String,
}

/// Insert payload for a user
///
/// The plain-text password is hashed by the service before this reaches a
/// repository; `password_digest` is already the PHC string.
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password_digest: String,
}

/// Partial update for a user
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, Validate)]
pub struct UserPatch {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub password_digest: Option<String>,
}

/// Normalizes an email the way it is stored and compared
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
