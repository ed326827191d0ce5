/// Repository ports and their adapters
///
/// The ports are async traits over plain entity structs:
///
/// - [`Repository<E>`]: insert, find, list, patch and delete for any [`Entity`]
/// - [`UserRepository`]: adds lookup by email
/// - [`TaskRepository`]: adds joined reads, filtered listing and reference
///   counting for the deletion guards
///
/// Two adapters implement every port: [`postgres::PgStore`] (sqlx) and
/// [`memory::InMemoryStore`], which enforces the same unique, foreign-key and
/// restrict rules so services behave identically against either.
///
/// Multi-step task writes are atomic in both adapters: inserting a task with
/// its labels, patching a task and replacing its labels, and deleting a task
/// together with its join rows.
///
/// # Example
///
/// ```
/// use taskman_shared::models::NewStatus;
/// use taskman_shared::repository::{Repositories, Repository};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repos = Repositories::in_memory();
/// let status = repos.statuses.insert(NewStatus { name: "new".to_string() }).await?;
/// assert_eq!(repos.statuses.find_by_id(status.id).await?, Some(status));
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::filter::TaskFilter;
use crate::models::{Entity, EntityKind, Label, Status, Task, TaskDetails, TaskReference, User};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failures reported by the store
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique column already holds this value
    #[error("{field} is already taken")]
    UniqueViolation { field: String },

    /// A foreign key names a row that does not exist
    #[error("{field} references a missing row")]
    MissingReference { field: String },

    /// A restrict foreign key blocked a delete
    #[error("{kind} {id} is still referenced by a task")]
    StillReferenced { kind: EntityKind, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The store itself cannot be used (poisoned lock, closed pool)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for one entity kind
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn insert(&self, new: E::New) -> RepositoryResult<E>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<E>>;

    /// Every row, ordered by id
    async fn list(&self) -> RepositoryResult<Vec<E>>;

    /// Applies `patch`; `Ok(None)` when the row does not exist
    async fn update(&self, id: i64, patch: E::Patch) -> RepositoryResult<Option<E>>;

    /// `Ok(false)` when the row does not exist
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;
}

#[async_trait]
pub trait UserRepository: Repository<User> {
    /// Looks up by normalized email
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

#[async_trait]
pub trait TaskRepository: Repository<Task> {
    async fn find_details(&self, id: i64) -> RepositoryResult<Option<TaskDetails>>;

    /// Tasks matching `filter`, with relations resolved, ordered by id
    async fn list_details(&self, filter: &TaskFilter) -> RepositoryResult<Vec<TaskDetails>>;

    async fn label_ids(&self, task_id: i64) -> RepositoryResult<BTreeSet<i64>>;

    /// Number of tasks depending on the referenced row
    async fn count_references(&self, reference: TaskReference) -> RepositoryResult<i64>;
}

/// One handle per port, shared across requests
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub statuses: Arc<dyn Repository<Status>>,
    pub labels: Arc<dyn Repository<Label>>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let store = postgres::PgStore::new(pool);
        Self {
            users: Arc::new(store.clone()),
            statuses: Arc::new(store.clone()),
            labels: Arc::new(store.clone()),
            tasks: Arc::new(store),
        }
    }

    pub fn in_memory() -> Self {
        let store = memory::InMemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            statuses: Arc::new(store.clone()),
            labels: Arc::new(store.clone()),
            tasks: Arc::new(store),
        }
    }
}
