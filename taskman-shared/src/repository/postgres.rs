//! PostgreSQL implementation of the repository ports.
//!
//! Joins and reference predicates are rendered from the typed
//! [`TaskRelation`] descriptors. Multi-step task writes run in one
//! transaction; label rows are locked `FOR SHARE` while they are being
//! associated so a concurrent label delete cannot slip in between.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;

use super::{
    Repository, RepositoryError, RepositoryResult, TaskRepository, UserRepository,
};
use crate::filter::TaskFilter;
use crate::models::{
    EntityKind, Label, LabelPatch, NewLabel, NewStatus, NewTask, NewUser, Status, StatusPatch,
    Task, TaskDetails, TaskPatch, TaskReference, TaskRelation, User, UserPatch, UserSummary,
};

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_digest, created_at, updated_at";
const NAMED_COLUMNS: &str = "id, name, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, name, description, status_id, creator_id, executor_id, created_at, updated_at";

/// sqlx-backed store implementing every repository port
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a constraint violation on insert or update
fn write_error(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        let field = field_from_constraint(db_err.constraint().unwrap_or_default());
        match db_err.code().as_deref() {
            Some("23505") => return RepositoryError::UniqueViolation { field },
            Some("23503") => return RepositoryError::MissingReference { field },
            _ => {}
        }
    }
    RepositoryError::Database(err)
}

/// Maps a restrict violation on delete
fn delete_error(err: sqlx::Error, kind: EntityKind, id: i64) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23503") {
            return RepositoryError::StillReferenced { kind, id };
        }
    }
    RepositoryError::Database(err)
}

/// `users_email_key` -> `email`, `tasks_status_id_fkey` -> `status_id`
fn field_from_constraint(constraint: &str) -> String {
    let stem = ["_fkey", "_pkey", "_key"]
        .iter()
        .find_map(|suffix| constraint.strip_suffix(suffix))
        .unwrap_or(constraint);

    ["tasks_labels_", "statuses_", "labels_", "users_", "tasks_"]
        .iter()
        .find_map(|prefix| stem.strip_prefix(prefix))
        .unwrap_or(stem)
        .to_string()
}

#[derive(FromRow)]
struct TaskDetailsRow {
    id: i64,
    name: String,
    description: Option<String>,
    status_id: i64,
    creator_id: i64,
    executor_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    status_name: String,
    creator_first_name: String,
    creator_last_name: String,
    executor_first_name: Option<String>,
    executor_last_name: Option<String>,
}

impl TaskDetailsRow {
    fn into_details(self, labels: Vec<Label>) -> TaskDetails {
        let executor = match (self.executor_id, self.executor_first_name, self.executor_last_name) {
            (Some(id), Some(first), Some(last)) => Some(UserSummary {
                id,
                full_name: format!("{} {}", first, last),
            }),
            _ => None,
        };

        TaskDetails {
            task: Task {
                id: self.id,
                name: self.name,
                description: self.description,
                status_id: self.status_id,
                creator_id: self.creator_id,
                executor_id: self.executor_id,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            status_name: self.status_name,
            creator: UserSummary {
                id: self.creator_id,
                full_name: format!("{} {}", self.creator_first_name, self.creator_last_name),
            },
            executor,
            labels,
        }
    }
}

#[derive(FromRow)]
struct TaskLabelRow {
    task_id: i64,
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// `SELECT ... FROM tasks t <joins> WHERE TRUE`, ready for more conditions
fn details_query<'a>() -> QueryBuilder<'a, Postgres> {
    let status = TaskRelation::Status.join().alias;
    let creator = TaskRelation::Creator.join().alias;
    let executor = TaskRelation::Executor.join().alias;
    let joins: Vec<String> = TaskRelation::ALL
        .iter()
        .filter_map(|relation| relation.join().sql_join())
        .collect();

    QueryBuilder::new(format!(
        "SELECT t.id, t.name, t.description, t.status_id, t.creator_id, t.executor_id, \
         t.created_at, t.updated_at, \
         {status}.name AS status_name, \
         {creator}.first_name AS creator_first_name, {creator}.last_name AS creator_last_name, \
         {executor}.first_name AS executor_first_name, {executor}.last_name AS executor_last_name \
         FROM tasks t {joins} WHERE TRUE",
        joins = joins.join(" "),
    ))
}

impl PgStore {
    async fn fetch_details(
        &self,
        mut builder: QueryBuilder<'_, Postgres>,
    ) -> RepositoryResult<Vec<TaskDetails>> {
        builder.push(" ORDER BY t.id");
        let rows: Vec<TaskDetailsRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        let task_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let label_rows: Vec<TaskLabelRow> = sqlx::query_as(
            r#"
            SELECT j.task_id, l.id, l.name, l.created_at, l.updated_at
            FROM tasks_labels j
            JOIN labels l ON l.id = j.label_id
            WHERE j.task_id = ANY($1)
            ORDER BY l.id
            "#,
        )
        .bind(&task_ids[..])
        .fetch_all(&self.pool)
        .await?;

        let mut labels_by_task: HashMap<i64, Vec<Label>> = HashMap::new();
        for row in label_rows {
            labels_by_task.entry(row.task_id).or_default().push(Label {
                id: row.id,
                name: row.name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let labels = labels_by_task.remove(&row.id).unwrap_or_default();
                row.into_details(labels)
            })
            .collect())
    }
}

/// Replaces the label set of `task_id` with the submitted ids that exist
async fn replace_labels(
    tx: &mut Transaction<'_, Postgres>,
    task_id: i64,
    submitted: &BTreeSet<i64>,
) -> RepositoryResult<()> {
    let requested: Vec<i64> = submitted.iter().copied().collect();
    let existing: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM labels WHERE id = ANY($1) ORDER BY id FOR SHARE")
            .bind(&requested[..])
            .fetch_all(&mut **tx)
            .await?;

    if existing.len() < requested.len() {
        debug!(
            task_id,
            requested = requested.len(),
            kept = existing.len(),
            "Dropping unknown label ids"
        );
    }

    sqlx::query("DELETE FROM tasks_labels WHERE task_id = $1 AND NOT (label_id = ANY($2))")
        .bind(task_id)
        .bind(&existing[..])
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO tasks_labels (task_id, label_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(task_id)
    .bind(&existing[..])
    .execute(&mut **tx)
    .await
    .map_err(write_error)?;

    Ok(())
}

async fn insert_named<T>(pool: &PgPool, table: &str, name: String) -> RepositoryResult<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(&format!(
        "INSERT INTO {table} (name) VALUES ($1) RETURNING {NAMED_COLUMNS}"
    ))
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(write_error)
}

async fn update_named<T>(
    pool: &PgPool,
    table: &str,
    id: i64,
    name: Option<String>,
) -> RepositoryResult<Option<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    sqlx::query_as::<_, T>(&format!(
        "UPDATE {table} SET name = COALESCE($2, name), updated_at = NOW() \
         WHERE id = $1 RETURNING {NAMED_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(write_error)
}

async fn find_named<T>(pool: &PgPool, table: &str, id: i64) -> RepositoryResult<Option<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    Ok(sqlx::query_as::<_, T>(&format!(
        "SELECT {NAMED_COLUMNS} FROM {table} WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

async fn list_named<T>(pool: &PgPool, table: &str) -> RepositoryResult<Vec<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    Ok(sqlx::query_as::<_, T>(&format!(
        "SELECT {NAMED_COLUMNS} FROM {table} ORDER BY id"
    ))
    .fetch_all(pool)
    .await?)
}

async fn delete_row(pool: &PgPool, kind: EntityKind, id: i64) -> RepositoryResult<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", kind.table()))
        .bind(id)
        .execute(pool)
        .await
        .map_err(|err| delete_error(err, kind, id))?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl Repository<User> for PgStore {
    async fn insert(&self, new: NewUser) -> RepositoryResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_digest)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.email)
        .bind(new.password_digest)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list(&self) -> RepositoryResult<Vec<User>> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update(&self, id: i64, patch: UserPatch) -> RepositoryResult<Option<User>> {
        // Only the fields present in the patch are written
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if patch.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${}", bind_count));
        }
        if patch.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${}", bind_count));
        }
        if patch.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if patch.password_digest.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_digest = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);
        if let Some(first_name) = patch.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = patch.last_name {
            q = q.bind(last_name);
        }
        if let Some(email) = patch.email {
            q = q.bind(email);
        }
        if let Some(password_digest) = patch.password_digest {
            q = q.bind(password_digest);
        }

        q.fetch_optional(&self.pool).await.map_err(write_error)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        delete_row(&self.pool, EntityKind::User, id).await
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?,
        )
    }
}

#[async_trait]
impl Repository<Status> for PgStore {
    async fn insert(&self, new: NewStatus) -> RepositoryResult<Status> {
        insert_named(&self.pool, EntityKind::Status.table(), new.name).await
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Status>> {
        find_named(&self.pool, EntityKind::Status.table(), id).await
    }

    async fn list(&self) -> RepositoryResult<Vec<Status>> {
        list_named(&self.pool, EntityKind::Status.table()).await
    }

    async fn update(&self, id: i64, patch: StatusPatch) -> RepositoryResult<Option<Status>> {
        update_named(&self.pool, EntityKind::Status.table(), id, patch.name).await
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        delete_row(&self.pool, EntityKind::Status, id).await
    }
}

#[async_trait]
impl Repository<Label> for PgStore {
    async fn insert(&self, new: NewLabel) -> RepositoryResult<Label> {
        insert_named(&self.pool, EntityKind::Label.table(), new.name).await
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Label>> {
        find_named(&self.pool, EntityKind::Label.table(), id).await
    }

    async fn list(&self) -> RepositoryResult<Vec<Label>> {
        list_named(&self.pool, EntityKind::Label.table()).await
    }

    async fn update(&self, id: i64, patch: LabelPatch) -> RepositoryResult<Option<Label>> {
        update_named(&self.pool, EntityKind::Label.table(), id, patch.name).await
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        delete_row(&self.pool, EntityKind::Label, id).await
    }
}

#[async_trait]
impl Repository<Task> for PgStore {
    async fn insert(&self, new: NewTask) -> RepositoryResult<Task> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (name, description, status_id, creator_id, executor_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.status_id)
        .bind(new.creator_id)
        .bind(new.executor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        replace_labels(&mut tx, task.id, &new.label_ids).await?;
        tx.commit().await?;

        Ok(task)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Task>> {
        Ok(
            sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list(&self) -> RepositoryResult<Vec<Task>> {
        Ok(
            sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id"))
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn update(&self, id: i64, patch: TaskPatch) -> RepositoryResult<Option<Task>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut task) = current else {
            return Ok(None);
        };
        patch.apply_to(&mut task);

        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET name = $2, description = $3, status_id = $4, executor_id = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.status_id)
        .bind(task.executor_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        if let Some(label_ids) = &patch.label_ids {
            replace_labels(&mut tx, id, label_ids).await?;
        }
        tx.commit().await?;

        Ok(Some(task))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM tasks_labels WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn find_details(&self, id: i64) -> RepositoryResult<Option<TaskDetails>> {
        let mut builder = details_query();
        builder.push(" AND t.id = ");
        builder.push_bind(id);
        Ok(self.fetch_details(builder).await?.into_iter().next())
    }

    async fn list_details(&self, filter: &TaskFilter) -> RepositoryResult<Vec<TaskDetails>> {
        let mut builder = details_query();
        filter.push_sql(&mut builder);
        self.fetch_details(builder).await
    }

    async fn label_ids(&self, task_id: i64) -> RepositoryResult<BTreeSet<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT label_id FROM tasks_labels WHERE task_id = $1")
                .bind(task_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids.into_iter().collect())
    }

    async fn count_references(&self, reference: TaskReference) -> RepositoryResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks t WHERE FALSE");
        for relation in reference.relations() {
            let (prefix, suffix) = relation.join().sql_predicate();
            builder.push(" OR ");
            builder.push(prefix);
            builder.push_bind(reference.id());
            builder.push(suffix);
        }

        Ok(builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?)
    }
}
