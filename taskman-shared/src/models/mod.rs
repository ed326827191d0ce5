/// Domain records for the task manager
///
/// Every entity is a plain data struct. Persistence lives behind the
/// repository ports in [`crate::repository`]; validation lives on the input
/// types (`New*` and `*Patch`) via `validator` derives.
///
/// # Models
///
/// - `user`: accounts that create and execute tasks
/// - `status`: workflow states a task can be in
/// - `label`: free-form tags attached to tasks through a join table
/// - `task`: the unit of work, plus its joined read model [`TaskDetails`]
/// - `relation`: typed descriptors for the task relations
///
/// # Example
///
/// ```
/// use taskman_shared::models::{Entity, EntityKind, Status};
///
/// assert_eq!(Status::KIND, EntityKind::Status);
/// assert_eq!(EntityKind::Status.table(), "statuses");
/// ```

pub mod label;
pub mod relation;
pub mod status;
pub mod task;
pub mod user;

pub use label::{Label, LabelPatch, NewLabel};
pub use relation::{JoinKind, JoinSpec, TaskReference, TaskRelation};
pub use status::{NewStatus, Status, StatusPatch};
pub use task::{NewTask, Task, TaskDetails, TaskPatch};
pub use user::{NewUser, User, UserPatch, UserSummary};

use serde::Serialize;
use std::fmt;

/// The kinds of rows the store knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Status,
    Label,
    Task,
}

impl EntityKind {
    /// Table backing this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Status => "statuses",
            EntityKind::Label => "labels",
            EntityKind::Task => "tasks",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::Status => "status",
            EntityKind::Label => "label",
            EntityKind::Task => "task",
        };
        f.write_str(name)
    }
}

/// A persisted record with a store-assigned identifier
///
/// `New` is the insert payload and `Patch` the partial update payload. Both
/// are owned so they can cross the async repository boundary.
pub trait Entity: Clone + Send + Sync + 'static {
    type New: Send + Sync;
    type Patch: Send + Sync;

    const KIND: EntityKind;

    fn id(&self) -> i64;
}
