//! Accounts
//!
//! Anyone may register. Editing and deleting an account is reserved to the
//! account owner, and an account that created or executes tasks cannot be
//! deleted.

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use super::guards;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::normalize_email;
use crate::models::{EntityKind, NewUser, TaskReference, User, UserPatch};
use crate::repository::{Repositories, Repository, UserRepository};
use crate::validation::ValidationErrors;

/// Registration form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Registration {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: String,
}

impl Registration {
    fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Profile edit form; a blank password keeps the current one
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl ProfileUpdate {
    fn into_patch(self) -> ServiceResult<UserPatch> {
        let patch = UserPatch {
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            email: Some(normalize_email(&self.email)),
            password_digest: None,
        };

        let mut errors = match patch.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors.into(),
        };
        let password_given = !self.password.is_empty();
        if password_given && (self.password.chars().count() as u64) < MIN_PASSWORD_LENGTH {
            errors.push("password", "Password must be at least 3 characters");
        }
        errors.into_result()?;

        Ok(UserPatch {
            password_digest: if password_given {
                Some(hash_password(&self.password)?)
            } else {
                None
            },
            ..patch
        })
    }
}

fn authorize_self(acting_user_id: i64, user_id: i64) -> ServiceResult<()> {
    if acting_user_id != user_id {
        warn!(acting_user_id, user_id, "Refusing to modify another user's account");
        return Err(ServiceError::Authorization(
            "users may only modify their own account".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(repos: &Repositories) -> ServiceResult<Vec<User>> {
    Ok(repos.users.list().await?)
}

pub async fn get(repos: &Repositories, id: i64) -> ServiceResult<User> {
    repos
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))
}

/// Creates an account; duplicate emails are a validation error on `email`
pub async fn register(repos: &Repositories, registration: Registration) -> ServiceResult<User> {
    let registration = registration.normalized();
    registration.validate()?;

    let user = repos
        .users
        .insert(NewUser {
            password_digest: hash_password(&registration.password)?,
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
        })
        .await?;

    info!(user_id = user.id, "Registered user");
    Ok(user)
}

/// Returns the user whose email and password match, if any
pub async fn authenticate(
    repos: &Repositories,
    email: &str,
    password: &str,
) -> ServiceResult<Option<User>> {
    let Some(user) = repos.users.find_by_email(&normalize_email(email)).await? else {
        return Ok(None);
    };

    if verify_password(password, &user.password_digest)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

pub async fn update_profile(
    repos: &Repositories,
    acting_user_id: i64,
    user_id: i64,
    update: ProfileUpdate,
) -> ServiceResult<User> {
    authorize_self(acting_user_id, user_id)?;

    let patch = update.into_patch()?;
    let user = repos
        .users
        .update(user_id, patch)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::User, user_id))?;

    info!(user_id, "Updated profile");
    Ok(user)
}

/// Deletes the acting user's own account when no task refers to it
pub async fn delete_account(
    repos: &Repositories,
    acting_user_id: i64,
    user_id: i64,
) -> ServiceResult<User> {
    authorize_self(acting_user_id, user_id)?;

    guards::delete_guarded(&*repos.users, &*repos.tasks, TaskReference::User(user_id)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(email: &str) -> Registration {
        Registration {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "qwe".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_hashes() {
        let repos = Repositories::in_memory();
        let user = register(&repos, registration(" ADA@example.com ")).await.unwrap();

        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.password_digest.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let repos = Repositories::in_memory();
        register(&repos, registration("ada@example.com")).await.unwrap();

        let err = register(&repos, registration("Ada@Example.com")).await.unwrap_err();
        match err {
            ServiceError::Validation(errors) => assert!(errors.has_field("email")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_validation() {
        let repos = Repositories::in_memory();
        let err = register(
            &repos,
            Registration {
                password: "qw".to_string(),
                email: "nope".to_string(),
                ..registration("")
            },
        )
        .await
        .unwrap_err();

        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.has_field("password"));
                assert!(errors.has_field("email"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(list(&repos).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let repos = Repositories::in_memory();
        let user = register(&repos, registration("ada@example.com")).await.unwrap();

        let found = authenticate(&repos, "ADA@example.com", "qwe").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
        assert!(authenticate(&repos, "ada@example.com", "bad").await.unwrap().is_none());
        assert!(authenticate(&repos, "who@example.com", "qwe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_keeps_password_when_blank() {
        let repos = Repositories::in_memory();
        let user = register(&repos, registration("ada@example.com")).await.unwrap();

        let updated = update_profile(
            &repos,
            user.id,
            user.id,
            ProfileUpdate {
                first_name: "Augusta".to_string(),
                last_name: "King".to_string(),
                email: "ada@example.com".to_string(),
                password: String::new(),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.full_name(), "Augusta King");
        assert_eq!(updated.password_digest, user.password_digest);
    }

    #[tokio::test]
    async fn test_cannot_edit_or_delete_someone_else() {
        let repos = Repositories::in_memory();
        let ada = register(&repos, registration("ada@example.com")).await.unwrap();
        let bob = register(&repos, registration("bob@example.com")).await.unwrap();

        let err = update_profile(&repos, bob.id, ada.id, ProfileUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));

        let err = delete_account(&repos, bob.id, ada.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Authorization(_)));
        assert!(get(&repos, ada.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_own_account() {
        let repos = Repositories::in_memory();
        let ada = register(&repos, registration("ada@example.com")).await.unwrap();

        let deleted = delete_account(&repos, ada.id, ada.id).await.unwrap();
        assert_eq!(deleted.id, ada.id);
        assert!(matches!(
            get(&repos, ada.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
