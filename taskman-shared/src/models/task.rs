/// Task model
///
/// A task belongs to one status and one creator, may have an executor, and
/// carries a set of labels through `tasks_labels`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     status_id BIGINT NOT NULL REFERENCES statuses(id) ON DELETE RESTRICT,
///     creator_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     executor_id BIGINT REFERENCES users(id) ON DELETE RESTRICT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE tasks_labels (
///     task_id BIGINT NOT NULL REFERENCES tasks(id) ON DELETE RESTRICT,
///     label_id BIGINT NOT NULL REFERENCES labels(id) ON DELETE RESTRICT,
///     PRIMARY KEY (task_id, label_id)
/// );
/// ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{Entity, EntityKind, Label, UserSummary};

/// A task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status_id: i64,

    /// Fixed at creation; only this user may delete the task
    pub creator_id: i64,

    pub executor_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn is_created_by(&self, user_id: i64) -> bool {
        self.creator_id == user_id
    }
}

impl Entity for Task {
    type New = NewTask;
    type Patch = TaskPatch;

    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> i64 {
        self.id
    }
}

/// A task with every relation resolved, as listed and shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDetails {
    #[serde(flatten)]
    pub task: Task,
    pub status_name: String,
    pub creator: UserSummary,
    pub executor: Option<UserSummary>,

    /// Ordered by label id
    pub labels: Vec<Label>,
}

impl TaskDetails {
    pub fn id(&self) -> i64 {
        self.task.id
    }

    pub fn label_ids(&self) -> BTreeSet<i64> {
        self.labels.iter().map(|label| label.id).collect()
    }
}

/// Insert payload for a task
///
/// `label_ids` may name labels that do not exist; those are dropped when the
/// task is stored.
#[derive(Debug, Clone, Validate)]
pub struct NewTask {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 1, message = "Status is required"))]
    pub status_id: i64,

    pub creator_id: i64,

    pub executor_id: Option<i64>,

    pub label_ids: BTreeSet<i64>,
}

/// Partial update for a task
///
/// The creator is deliberately absent. `label_ids: Some(set)` replaces the
/// whole association set; `None` leaves it alone.
#[derive(Debug, Clone, Default, Validate)]
pub struct TaskPatch {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,

    pub description: Option<Option<String>>,

    #[validate(range(min = 1, message = "Status is required"))]
    pub status_id: Option<i64>,

    pub executor_id: Option<Option<i64>>,

    pub label_ids: Option<BTreeSet<i64>>,
}

impl TaskPatch {
    /// Applies the scalar fields of this patch to `task`
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status_id) = self.status_id {
            task.status_id = status_id;
        }
        if let Some(executor_id) = self.executor_id {
            task.executor_id = executor_id;
        }
    }
}
