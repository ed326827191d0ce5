//! Task filter composer
//!
//! Turns the raw query parameters of the task list (`status`, `executor`,
//! `label`, `isCreatorUser`) into a [`TaskFilter`], a conjunction of
//! relation conditions. The same filter can be evaluated in memory with
//! [`TaskFilter::apply`] or appended to a SQL listing with
//! [`TaskFilter::push_sql`]; both give the same rows, ordered by task id.
//!
//! Values that are absent, empty, non-numeric, zero or negative mean "no
//! filter" for that dimension. They are never errors.
//!
//! # Example
//!
//! ```
//! use taskman_shared::filter::{TaskFilter, TaskQuery};
//!
//! let query = TaskQuery {
//!     status: Some("2".to_string()),
//!     executor: Some(String::new()),
//!     label: Some("abc".to_string()),
//!     is_creator_user: Some("on".to_string()),
//! };
//!
//! let filter = TaskFilter::from_query(&query, 7);
//! assert_eq!(filter.status(), Some(2));
//! assert_eq!(filter.executor(), None);
//! assert_eq!(filter.label(), None);
//! assert_eq!(filter.creator(), Some(7));
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::models::{TaskDetails, TaskRelation};

/// Task list query parameters as they arrive from the request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
    pub executor: Option<String>,
    pub label: Option<String>,
    #[serde(rename = "isCreatorUser")]
    pub is_creator_user: Option<String>,
}

/// Collects raw `(name, value)` pairs; a repeated parameter keeps its last
/// value and unknown names are ignored
impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for TaskQuery {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut query = TaskQuery::default();
        for (name, value) in pairs {
            let slot = match name.as_ref() {
                "status" => &mut query.status,
                "executor" => &mut query.executor,
                "label" => &mut query.label,
                "isCreatorUser" => &mut query.is_creator_user,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        query
    }
}

/// A composed task filter
///
/// The creator dimension can only be bound to the acting user, through
/// [`TaskFilter::from_query`] or [`TaskFilter::created_by`] with the session
/// user id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    status: Option<i64>,
    executor: Option<i64>,
    label: Option<i64>,
    creator: Option<i64>,
}

/// The applied filter, echoed back to the form that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub status: Option<i64>,
    pub executor: Option<i64>,
    pub label: Option<i64>,
    #[serde(rename = "isCreatorUser")]
    pub is_creator_user: bool,
}

impl TaskFilter {
    /// The empty filter: every task matches
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_query(query: &TaskQuery, acting_user_id: i64) -> Self {
        let filter = Self {
            status: coerce_id(query.status.as_deref()),
            executor: coerce_id(query.executor.as_deref()),
            label: coerce_id(query.label.as_deref()),
            creator: None,
        };

        if is_truthy(query.is_creator_user.as_deref()) {
            filter.created_by(acting_user_id)
        } else {
            filter
        }
    }

    pub fn with_status(mut self, status_id: i64) -> Self {
        self.status = positive(status_id);
        self
    }

    pub fn with_executor(mut self, executor_id: i64) -> Self {
        self.executor = positive(executor_id);
        self
    }

    pub fn with_label(mut self, label_id: i64) -> Self {
        self.label = positive(label_id);
        self
    }

    /// Restricts to tasks created by the acting user
    pub fn created_by(mut self, acting_user_id: i64) -> Self {
        self.creator = positive(acting_user_id);
        self
    }

    pub fn status(&self) -> Option<i64> {
        self.status
    }

    pub fn executor(&self) -> Option<i64> {
        self.executor
    }

    pub fn label(&self) -> Option<i64> {
        self.label
    }

    pub fn creator(&self) -> Option<i64> {
        self.creator
    }

    pub fn is_empty(&self) -> bool {
        self.conditions().is_empty()
    }

    /// Active conditions, each a relation that must point at an id
    pub fn conditions(&self) -> Vec<(TaskRelation, i64)> {
        [
            (TaskRelation::Status, self.status),
            (TaskRelation::Executor, self.executor),
            (TaskRelation::Labels, self.label),
            (TaskRelation::Creator, self.creator),
        ]
        .into_iter()
        .filter_map(|(relation, id)| id.map(|id| (relation, id)))
        .collect()
    }

    pub fn matches(&self, details: &TaskDetails) -> bool {
        let label_ids = details.label_ids();
        self.conditions()
            .into_iter()
            .all(|(relation, id)| relation.points_at(&details.task, &label_ids, id))
    }

    /// Matching tasks, cloned out of `tasks` and ordered by id
    pub fn apply(&self, tasks: &[TaskDetails]) -> Vec<TaskDetails> {
        let mut matching: Vec<TaskDetails> = tasks
            .iter()
            .filter(|details| self.matches(details))
            .cloned()
            .collect();
        matching.sort_by_key(|details| details.id());
        matching
    }

    /// Appends ` AND <condition>` for each active condition
    ///
    /// The builder must already hold a `WHERE` clause over the `tasks t`
    /// alias.
    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        for (relation, id) in self.conditions() {
            let (prefix, suffix) = relation.join().sql_predicate();
            builder.push(" AND ");
            builder.push(prefix);
            builder.push_bind(id);
            builder.push(suffix);
        }
    }

    pub fn state(&self) -> FilterState {
        FilterState {
            status: self.status,
            executor: self.executor,
            label: self.label,
            is_creator_user: self.creator.is_some(),
        }
    }
}

/// Parses a filter id; anything that is not a positive integer is `None`
pub fn coerce_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .and_then(positive)
}

/// Checkbox-style flag parsing
pub fn is_truthy(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|value| value.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

fn positive(id: i64) -> Option<i64> {
    (id > 0).then_some(id)
}
