//! Use-case errors
//!
//! Every service returns [`ServiceResult`]. The web layer turns each kind
//! into a response: validation errors re-render the form, conflicts and
//! authorization failures become a flash message, and only `Repository`
//! and `Password` are treated as faults.

use thiserror::Error;
use tracing::error;

use crate::auth::password::PasswordError;
use crate::models::EntityKind;
use crate::repository::RepositoryError;
use crate::validation::ValidationErrors;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed required-field, format, reference or uniqueness rules
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// Deletion refused because tasks still depend on the row
    #[error("{kind} {id} is still used by tasks")]
    ReferentialConflict { kind: EntityKind, id: i64 },

    /// The acting user may not perform this mutation
    #[error("not authorized: {0}")]
    Authorization(String),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        ServiceError::NotFound { kind, id }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.into())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueViolation { field } => {
                ServiceError::Validation(ValidationErrors::single(field, "Is already taken"))
            }
            RepositoryError::MissingReference { field } => {
                ServiceError::Validation(ValidationErrors::single(field, "Does not exist"))
            }
            RepositoryError::StillReferenced { kind, id } => ServiceError::ReferentialConflict { kind, id },
            RepositoryError::Database(_) | RepositoryError::Unavailable(_) => {
                error!(error = %err, "Store failure");
                ServiceError::Repository(err)
            }
            other => ServiceError::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_becomes_validation() {
        let err: ServiceError = RepositoryError::UniqueViolation {
            field: "email".to_string(),
        }
        .into();

        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.has_field("email"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_restrict_violation_becomes_conflict() {
        let err: ServiceError = RepositoryError::StillReferenced {
            kind: EntityKind::Label,
            id: 3,
        }
        .into();

        assert!(matches!(
            err,
            ServiceError::ReferentialConflict {
                kind: EntityKind::Label,
                id: 3
            }
        ));
    }

    #[test]
    fn test_store_failures_stay_faults() {
        let err: ServiceError = RepositoryError::Unavailable("lock poisoned".to_string()).into();
        assert!(matches!(err, ServiceError::Repository(RepositoryError::Unavailable(_))));
    }

    #[test]
    fn test_display() {
        let err = ServiceError::ReferentialConflict {
            kind: EntityKind::Status,
            id: 1,
        };
        assert_eq!(err.to_string(), "status 1 is still used by tasks");
    }
}
