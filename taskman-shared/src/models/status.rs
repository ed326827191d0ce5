/// Status model
///
/// A status is a named workflow state ("new", "in progress", ...). Every
/// task points at exactly one status, so a status in use cannot be deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE statuses (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL UNIQUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Status {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Status {
    type New = NewStatus;
    type Patch = StatusPatch;

    const KIND: EntityKind = EntityKind::Status;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Validate)]
pub struct NewStatus {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct StatusPatch {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_rejected() {
        let errors = NewStatus { name: String::new() }.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_empty_patch_is_valid() {
        assert!(StatusPatch::default().validate().is_ok());
    }
}
