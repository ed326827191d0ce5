/// Typed relation descriptors for tasks
///
/// Each relation a task has is an enum variant with a fixed [`JoinSpec`].
/// The PostgreSQL store renders joins and predicates from these specs, the
/// in-memory store evaluates them directly, and both the filter composer and
/// the deletion guards are expressed in terms of them.

use std::collections::BTreeSet;

use super::{EntityKind, Task};

/// Alias of the `tasks` table in every rendered query
pub const TASK_ALIAS: &str = "t";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRelation {
    Status,
    Creator,
    Executor,
    Labels,
}

/// How a relation reaches its target table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// A foreign key column on `tasks`
    BelongsTo { column: &'static str, optional: bool },

    /// A join table holding `(owner_key, target_key)` pairs
    ManyToMany {
        join_table: &'static str,
        owner_key: &'static str,
        target_key: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    pub target: EntityKind,
    pub alias: &'static str,
    pub kind: JoinKind,
}

impl TaskRelation {
    pub const ALL: [TaskRelation; 4] = [
        TaskRelation::Status,
        TaskRelation::Creator,
        TaskRelation::Executor,
        TaskRelation::Labels,
    ];

    pub fn join(&self) -> JoinSpec {
        match self {
            TaskRelation::Status => JoinSpec {
                target: EntityKind::Status,
                alias: "s",
                kind: JoinKind::BelongsTo {
                    column: "status_id",
                    optional: false,
                },
            },
            TaskRelation::Creator => JoinSpec {
                target: EntityKind::User,
                alias: "c",
                kind: JoinKind::BelongsTo {
                    column: "creator_id",
                    optional: false,
                },
            },
            TaskRelation::Executor => JoinSpec {
                target: EntityKind::User,
                alias: "e",
                kind: JoinKind::BelongsTo {
                    column: "executor_id",
                    optional: true,
                },
            },
            TaskRelation::Labels => JoinSpec {
                target: EntityKind::Label,
                alias: "l",
                kind: JoinKind::ManyToMany {
                    join_table: "tasks_labels",
                    owner_key: "task_id",
                    target_key: "label_id",
                },
            },
        }
    }

    /// Whether `task` points at the row `target_id` through this relation
    pub fn points_at(&self, task: &Task, label_ids: &BTreeSet<i64>, target_id: i64) -> bool {
        match self {
            TaskRelation::Status => task.status_id == target_id,
            TaskRelation::Creator => task.creator_id == target_id,
            TaskRelation::Executor => task.executor_id == Some(target_id),
            TaskRelation::Labels => label_ids.contains(&target_id),
        }
    }
}

impl JoinSpec {
    /// `JOIN` clause for a belongs-to relation; `None` for many-to-many,
    /// which is loaded in a second query to avoid multiplying rows
    pub fn sql_join(&self) -> Option<String> {
        match self.kind {
            JoinKind::BelongsTo { column, optional } => Some(format!(
                "{join} {table} {alias} ON {alias}.id = {owner}.{column}",
                join = if optional { "LEFT JOIN" } else { "JOIN" },
                table = self.target.table(),
                alias = self.alias,
                owner = TASK_ALIAS,
            )),
            JoinKind::ManyToMany { .. } => None,
        }
    }

    /// SQL around a bound target id: `(prefix, suffix)` such that
    /// `prefix $n suffix` is true when the task points at `$n`
    pub fn sql_predicate(&self) -> (String, &'static str) {
        match self.kind {
            JoinKind::BelongsTo { column, .. } => (format!("{TASK_ALIAS}.{column} = "), ""),
            JoinKind::ManyToMany {
                join_table,
                owner_key,
                target_key,
            } => (
                format!(
                    "EXISTS (SELECT 1 FROM {join_table} j WHERE j.{owner_key} = {TASK_ALIAS}.id AND j.{target_key} = "
                ),
                ")",
            ),
        }
    }
}

/// A row that tasks may depend on, checked before it is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskReference {
    Status(i64),
    Label(i64),
    User(i64),
}

impl TaskReference {
    pub fn kind(&self) -> EntityKind {
        match self {
            TaskReference::Status(_) => EntityKind::Status,
            TaskReference::Label(_) => EntityKind::Label,
            TaskReference::User(_) => EntityKind::User,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            TaskReference::Status(id) | TaskReference::Label(id) | TaskReference::User(id) => *id,
        }
    }

    /// Relations through which a task can depend on this row
    pub fn relations(&self) -> &'static [TaskRelation] {
        match self {
            TaskReference::Status(_) => &[TaskRelation::Status],
            TaskReference::Label(_) => &[TaskRelation::Labels],
            TaskReference::User(_) => &[TaskRelation::Creator, TaskRelation::Executor],
        }
    }

    pub fn is_referenced_by(&self, task: &Task, label_ids: &BTreeSet<i64>) -> bool {
        self.relations()
            .iter()
            .any(|relation| relation.points_at(task, label_ids, self.id()))
    }
}
