//! In-memory implementation of the repository ports.
//!
//! One [`InMemoryStore`] holds every table behind a single [`RwLock`], so a
//! write lock covers a whole multi-step operation the way a transaction does
//! in PostgreSQL. It mirrors the schema constraints: unique names and emails,
//! foreign keys on tasks, restrict-on-delete for referenced rows, and a
//! `(task_id, label_id)` set for the join table.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    Repository, RepositoryError, RepositoryResult, TaskRepository, UserRepository,
};
use crate::filter::TaskFilter;
use crate::models::{
    EntityKind, Label, LabelPatch, NewLabel, NewStatus, NewTask, NewUser, Status, StatusPatch,
    Task, TaskDetails, TaskPatch, TaskReference, User, UserPatch,
};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, User>,
    statuses: BTreeMap<i64, Status>,
    labels: BTreeMap<i64, Label>,
    tasks: BTreeMap<i64, Task>,
    task_labels: BTreeSet<(i64, i64)>,
    sequences: HashMap<EntityKind, i64>,
}

impl State {
    fn next_id(&mut self, kind: EntityKind) -> i64 {
        let id = self.sequences.entry(kind).or_insert(0);
        *id += 1;
        *id
    }

    fn label_ids_of(&self, task_id: i64) -> BTreeSet<i64> {
        self.task_labels
            .range((task_id, i64::MIN)..=(task_id, i64::MAX))
            .map(|(_, label_id)| *label_id)
            .collect()
    }

    /// Submitted ids that name existing labels
    fn existing_labels(&self, submitted: &BTreeSet<i64>) -> BTreeSet<i64> {
        submitted
            .iter()
            .copied()
            .filter(|id| self.labels.contains_key(id))
            .collect()
    }

    fn replace_labels(&mut self, task_id: i64, label_ids: &BTreeSet<i64>) {
        let current = self.label_ids_of(task_id);
        for stale in current.difference(label_ids) {
            self.task_labels.remove(&(task_id, *stale));
        }
        for label_id in label_ids {
            self.task_labels.insert((task_id, *label_id));
        }
    }

    fn check_task_references(&self, task: &Task) -> RepositoryResult<()> {
        if !self.statuses.contains_key(&task.status_id) {
            return Err(missing("status_id"));
        }
        if !self.users.contains_key(&task.creator_id) {
            return Err(missing("creator_id"));
        }
        if let Some(executor_id) = task.executor_id {
            if !self.users.contains_key(&executor_id) {
                return Err(missing("executor_id"));
            }
        }
        Ok(())
    }

    fn count_references(&self, reference: TaskReference) -> i64 {
        self.tasks
            .values()
            .filter(|task| reference.is_referenced_by(task, &self.label_ids_of(task.id)))
            .count() as i64
    }

    fn details(&self, task: &Task) -> Option<TaskDetails> {
        let status = self.statuses.get(&task.status_id)?;
        let creator = self.users.get(&task.creator_id)?;
        let executor = task
            .executor_id
            .and_then(|id| self.users.get(&id))
            .map(User::summary);
        let labels = self
            .label_ids_of(task.id)
            .iter()
            .filter_map(|id| self.labels.get(id).cloned())
            .collect();

        Some(TaskDetails {
            task: task.clone(),
            status_name: status.name.clone(),
            creator: creator.summary(),
            executor,
            labels,
        })
    }
}

fn missing(field: &str) -> RepositoryError {
    RepositoryError::MissingReference {
        field: field.to_string(),
    }
}

fn taken(field: &str) -> RepositoryError {
    RepositoryError::UniqueViolation {
        field: field.to_string(),
    }
}

/// Thread-safe in-memory store implementing every repository port
///
/// # Example
///
/// ```
/// use taskman_shared::repository::memory::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// let shared = store.clone(); // same tables
/// # drop(shared);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| RepositoryError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| RepositoryError::Unavailable(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl Repository<User> for InMemoryStore {
    async fn insert(&self, new: NewUser) -> RepositoryResult<User> {
        let mut state = self.write()?;
        if state.users.values().any(|user| user.email == new.email) {
            return Err(taken("email"));
        }

        let now = Utc::now();
        let user = User {
            id: state.next_id(EntityKind::User),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_digest: new.password_digest,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<User>> {
        Ok(self.read()?.users.values().cloned().collect())
    }

    async fn update(&self, id: i64, patch: UserPatch) -> RepositoryResult<Option<User>> {
        let mut state = self.write()?;
        if let Some(email) = &patch.email {
            if state
                .users
                .values()
                .any(|user| user.id != id && &user.email == email)
            {
                return Err(taken("email"));
            }
        }

        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = last_name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(password_digest) = patch.password_digest {
            user.password_digest = password_digest;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state.count_references(TaskReference::User(id)) > 0 {
            return Err(RepositoryError::StillReferenced {
                kind: EntityKind::User,
                id,
            });
        }
        Ok(state.users.remove(&id).is_some())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }
}

#[async_trait]
impl Repository<Status> for InMemoryStore {
    async fn insert(&self, new: NewStatus) -> RepositoryResult<Status> {
        let mut state = self.write()?;
        if state.statuses.values().any(|status| status.name == new.name) {
            return Err(taken("name"));
        }

        let now = Utc::now();
        let status = Status {
            id: state.next_id(EntityKind::Status),
            name: new.name,
            created_at: now,
            updated_at: now,
        };
        state.statuses.insert(status.id, status.clone());
        Ok(status)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Status>> {
        Ok(self.read()?.statuses.get(&id).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Status>> {
        Ok(self.read()?.statuses.values().cloned().collect())
    }

    async fn update(&self, id: i64, patch: StatusPatch) -> RepositoryResult<Option<Status>> {
        let mut state = self.write()?;
        if let Some(name) = &patch.name {
            if state
                .statuses
                .values()
                .any(|status| status.id != id && &status.name == name)
            {
                return Err(taken("name"));
            }
        }

        let Some(status) = state.statuses.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            status.name = name;
        }
        status.updated_at = Utc::now();
        Ok(Some(status.clone()))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state.count_references(TaskReference::Status(id)) > 0 {
            return Err(RepositoryError::StillReferenced {
                kind: EntityKind::Status,
                id,
            });
        }
        Ok(state.statuses.remove(&id).is_some())
    }
}

#[async_trait]
impl Repository<Label> for InMemoryStore {
    async fn insert(&self, new: NewLabel) -> RepositoryResult<Label> {
        let mut state = self.write()?;
        if state.labels.values().any(|label| label.name == new.name) {
            return Err(taken("name"));
        }

        let now = Utc::now();
        let label = Label {
            id: state.next_id(EntityKind::Label),
            name: new.name,
            created_at: now,
            updated_at: now,
        };
        state.labels.insert(label.id, label.clone());
        Ok(label)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Label>> {
        Ok(self.read()?.labels.get(&id).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Label>> {
        Ok(self.read()?.labels.values().cloned().collect())
    }

    async fn update(&self, id: i64, patch: LabelPatch) -> RepositoryResult<Option<Label>> {
        let mut state = self.write()?;
        if let Some(name) = &patch.name {
            if state
                .labels
                .values()
                .any(|label| label.id != id && &label.name == name)
            {
                return Err(taken("name"));
            }
        }

        let Some(label) = state.labels.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            label.name = name;
        }
        label.updated_at = Utc::now();
        Ok(Some(label.clone()))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state.count_references(TaskReference::Label(id)) > 0 {
            return Err(RepositoryError::StillReferenced {
                kind: EntityKind::Label,
                id,
            });
        }
        Ok(state.labels.remove(&id).is_some())
    }
}

#[async_trait]
impl Repository<Task> for InMemoryStore {
    async fn insert(&self, new: NewTask) -> RepositoryResult<Task> {
        let mut state = self.write()?;
        let now = Utc::now();
        let mut task = Task {
            id: 0,
            name: new.name,
            description: new.description,
            status_id: new.status_id,
            creator_id: new.creator_id,
            executor_id: new.executor_id,
            created_at: now,
            updated_at: now,
        };
        state.check_task_references(&task)?;

        task.id = state.next_id(EntityKind::Task);
        let label_ids = state.existing_labels(&new.label_ids);
        state.tasks.insert(task.id, task.clone());
        state.replace_labels(task.id, &label_ids);
        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list(&self) -> RepositoryResult<Vec<Task>> {
        Ok(self.read()?.tasks.values().cloned().collect())
    }

    async fn update(&self, id: i64, patch: TaskPatch) -> RepositoryResult<Option<Task>> {
        let mut state = self.write()?;
        let Some(mut task) = state.tasks.get(&id).cloned() else {
            return Ok(None);
        };

        // Everything is checked before the first write.
        patch.apply_to(&mut task);
        state.check_task_references(&task)?;
        let label_ids = patch
            .label_ids
            .as_ref()
            .map(|submitted| state.existing_labels(submitted));

        task.updated_at = Utc::now();
        state.tasks.insert(id, task.clone());
        if let Some(label_ids) = label_ids {
            state.replace_labels(id, &label_ids);
        }
        Ok(Some(task))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.write()?;
        if state.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        state.replace_labels(id, &BTreeSet::new());
        Ok(true)
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn find_details(&self, id: i64) -> RepositoryResult<Option<TaskDetails>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).and_then(|task| state.details(task)))
    }

    async fn list_details(&self, filter: &TaskFilter) -> RepositoryResult<Vec<TaskDetails>> {
        let state = self.read()?;
        let all: Vec<TaskDetails> = state
            .tasks
            .values()
            .filter_map(|task| state.details(task))
            .collect();
        Ok(filter.apply(&all))
    }

    async fn label_ids(&self, task_id: i64) -> RepositoryResult<BTreeSet<i64>> {
        Ok(self.read()?.label_ids_of(task_id))
    }

    async fn count_references(&self, reference: TaskReference) -> RepositoryResult<i64> {
        Ok(self.read()?.count_references(reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[i64]) -> BTreeSet<i64> {
        values.iter().copied().collect()
    }

    async fn seed(store: &InMemoryStore) -> (User, Status) {
        let user = Repository::<User>::insert(
            store,
            NewUser {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                password_digest: "digest".to_string(),
            },
        )
        .await
        .unwrap();
        let status = Repository::<Status>::insert(
            store,
            NewStatus {
                name: "new".to_string(),
            },
        )
        .await
        .unwrap();
        (user, status)
    }

    #[tokio::test]
    async fn test_ids_are_sequential_per_table() {
        let store = InMemoryStore::new();
        let (user, status) = seed(&store).await;
        assert_eq!(user.id, 1);
        assert_eq!(status.id, 1);

        let second = Repository::<Status>::insert(
            &store,
            NewStatus {
                name: "done".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_duplicate_status_name_rejected() {
        let store = InMemoryStore::new();
        seed(&store).await;

        let err = Repository::<Status>::insert(
            &store,
            NewStatus {
                name: "new".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation { field } if field == "name"));
    }

    #[tokio::test]
    async fn test_task_insert_requires_existing_status() {
        let store = InMemoryStore::new();
        let (user, _) = seed(&store).await;

        let err = Repository::<Task>::insert(
            &store,
            NewTask {
                name: "orphan".to_string(),
                description: None,
                status_id: 42,
                creator_id: user.id,
                executor_id: None,
                label_ids: BTreeSet::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepositoryError::MissingReference { field } if field == "status_id"));
        assert!(Repository::<Task>::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_labels_intact() {
        let store = InMemoryStore::new();
        let (user, status) = seed(&store).await;
        let label = Repository::<Label>::insert(
            &store,
            NewLabel {
                name: "bug".to_string(),
            },
        )
        .await
        .unwrap();
        let task = Repository::<Task>::insert(
            &store,
            NewTask {
                name: "fix".to_string(),
                description: None,
                status_id: status.id,
                creator_id: user.id,
                executor_id: None,
                label_ids: ids(&[label.id]),
            },
        )
        .await
        .unwrap();

        let result = Repository::<Task>::update(
            &store,
            task.id,
            TaskPatch {
                executor_id: Some(Some(999)),
                label_ids: Some(BTreeSet::new()),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(RepositoryError::MissingReference { .. })));
        assert_eq!(store.label_ids(task.id).await.unwrap(), ids(&[label.id]));
        assert_eq!(
            Repository::<Task>::find_by_id(&store, task.id)
                .await
                .unwrap()
                .unwrap()
                .executor_id,
            None
        );
    }

    #[tokio::test]
    async fn test_restrict_on_delete() {
        let store = InMemoryStore::new();
        let (user, status) = seed(&store).await;
        Repository::<Task>::insert(
            &store,
            NewTask {
                name: "fix".to_string(),
                description: None,
                status_id: status.id,
                creator_id: user.id,
                executor_id: None,
                label_ids: BTreeSet::new(),
            },
        )
        .await
        .unwrap();

        let err = Repository::<Status>::delete(&store, status.id).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::StillReferenced {
                kind: EntityKind::Status,
                ..
            }
        ));
        let err = Repository::<User>::delete(&store, user.id).await.unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::StillReferenced {
                kind: EntityKind::User,
                ..
            }
        ));
    }
}
