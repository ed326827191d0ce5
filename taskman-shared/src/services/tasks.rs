//! Tasks
//!
//! Any signed-in user may create, view and edit tasks. The creator is the
//! acting user at creation time and never changes; only the creator may
//! delete a task. Label ids that name no label are dropped when a task is
//! stored, and an update carrying a label set replaces the whole set in the
//! same transaction as the task row.

use std::collections::BTreeSet;

use tracing::{info, warn};
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::filter::TaskFilter;
use crate::models::{EntityKind, NewTask, Task, TaskDetails, TaskPatch};
use crate::repository::{Repositories, Repository, TaskRepository};
use crate::validation::ValidationErrors;

/// Task form contents, before the creator is attached
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub name: String,
    pub description: Option<String>,
    pub status_id: Option<i64>,
    pub executor_id: Option<i64>,
    pub label_ids: BTreeSet<i64>,
}

impl TaskDraft {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            description: self
                .description
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            ..self
        }
    }

    pub fn into_new(self, creator_id: i64) -> NewTask {
        let draft = self.normalized();
        NewTask {
            name: draft.name,
            description: draft.description,
            status_id: draft.status_id.unwrap_or(0),
            creator_id,
            executor_id: draft.executor_id,
            label_ids: draft.label_ids,
        }
    }

    /// A patch that overwrites every editable field, labels included
    pub fn into_patch(self) -> TaskPatch {
        let draft = self.normalized();
        TaskPatch {
            name: Some(draft.name),
            description: Some(draft.description),
            status_id: Some(draft.status_id.unwrap_or(0)),
            executor_id: Some(draft.executor_id),
            label_ids: Some(draft.label_ids),
        }
    }
}

/// Checks that the status and executor a task points at exist
async fn check_references(
    repos: &Repositories,
    mut errors: ValidationErrors,
    status_id: Option<i64>,
    executor_id: Option<i64>,
) -> ServiceResult<()> {
    if let Some(status_id) = status_id {
        if !errors.has_field("status_id") && repos.statuses.find_by_id(status_id).await?.is_none() {
            errors.push("status_id", "Status does not exist");
        }
    }
    if let Some(executor_id) = executor_id {
        if repos.users.find_by_id(executor_id).await?.is_none() {
            errors.push("executor_id", "Executor does not exist");
        }
    }
    Ok(errors.into_result()?)
}

fn collect(result: Result<(), validator::ValidationErrors>) -> ValidationErrors {
    match result {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors.into(),
    }
}

pub async fn list(repos: &Repositories, filter: &TaskFilter) -> ServiceResult<Vec<TaskDetails>> {
    Ok(repos.tasks.list_details(filter).await?)
}

pub async fn get(repos: &Repositories, id: i64) -> ServiceResult<Task> {
    repos
        .tasks
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Task, id))
}

pub async fn get_details(repos: &Repositories, id: i64) -> ServiceResult<TaskDetails> {
    repos
        .tasks
        .find_details(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Task, id))
}

/// Creates a task owned by the acting user
pub async fn create(
    repos: &Repositories,
    acting_user_id: i64,
    draft: TaskDraft,
) -> ServiceResult<Task> {
    let new = draft.into_new(acting_user_id);
    let errors = collect(new.validate());
    check_references(repos, errors, Some(new.status_id), new.executor_id).await?;

    let task = repos.tasks.insert(new).await?;
    info!(task_id = task.id, creator_id = acting_user_id, "Created task");
    Ok(task)
}

/// Applies a partial update; the creator is never changed
pub async fn update(
    repos: &Repositories,
    acting_user_id: i64,
    id: i64,
    patch: TaskPatch,
) -> ServiceResult<Task> {
    get(repos, id).await?;

    let errors = collect(patch.validate());
    check_references(repos, errors, patch.status_id, patch.executor_id.flatten()).await?;

    let task = repos
        .tasks
        .update(id, patch)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Task, id))?;
    info!(task_id = id, acting_user_id, "Updated task");
    Ok(task)
}

/// Deletes a task and its label associations; creator only
pub async fn delete(repos: &Repositories, acting_user_id: i64, id: i64) -> ServiceResult<Task> {
    let task = get(repos, id).await?;
    if !task.is_created_by(acting_user_id) {
        warn!(task_id = id, acting_user_id, creator_id = task.creator_id, "Refusing to delete another user's task");
        return Err(ServiceError::Authorization(
            "only the creator may delete a task".to_string(),
        ));
    }

    if !repos.tasks.delete(id).await? {
        return Err(ServiceError::not_found(EntityKind::Task, id));
    }
    info!(task_id = id, acting_user_id, "Deleted task");
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_normalization() {
        let new = TaskDraft {
            name: "  Ship it ".to_string(),
            description: Some("   ".to_string()),
            status_id: None,
            executor_id: Some(3),
            label_ids: BTreeSet::new(),
        }
        .into_new(9);

        assert_eq!(new.name, "Ship it");
        assert_eq!(new.description, None);
        assert_eq!(new.status_id, 0);
        assert_eq!(new.creator_id, 9);
        assert_eq!(new.executor_id, Some(3));
    }

    #[test]
    fn test_draft_patch_overwrites_everything() {
        let patch = TaskDraft {
            name: "n".to_string(),
            status_id: Some(2),
            ..Default::default()
        }
        .into_patch();

        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.executor_id, Some(None));
        assert_eq!(patch.label_ids, Some(BTreeSet::new()));
        assert_eq!(patch.status_id, Some(2));
    }
}
