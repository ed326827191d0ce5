/// Label model
///
/// Labels tag tasks through the `tasks_labels` join table. A label attached
/// to any task cannot be deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE labels (
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
pub struct Label {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Label {
    type New = NewLabel;
    type Patch = LabelPatch;

    const KIND: EntityKind = EntityKind::Label;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Validate)]
pub struct NewLabel {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct LabelPatch {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
}
