//! PostgreSQL adapter tests
//!
//! These need a database and are skipped unless DATABASE_URL is set.
//! Rows are created with unique names so the tests can share a database.

mod common;

use std::collections::BTreeSet;

use chrono::Utc;
use taskman_shared::db::migrations::run_migrations;
use taskman_shared::db::pool::{create_pool, DatabaseConfig};
use taskman_shared::filter::TaskFilter;
use taskman_shared::models::TaskReference;
use taskman_shared::repository::{Repositories, Repository, RepositoryError, TaskRepository};
use taskman_shared::services::{catalog, tasks};
use taskman_shared::ServiceError;

async fn repositories() -> Option<Repositories> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 2,
        ..Default::default()
    })
    .await
    .expect("Failed to connect");
    run_migrations(&pool).await.expect("Failed to migrate");
    Some(Repositories::postgres(pool))
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
async fn test_filter_and_label_replacement() {
    let Some(repos) = repositories().await else {
        return;
    };
    let creator = common::insert_user_with_email(&repos, &format!("{}@example.com", unique("c"))).await;
    let executor = common::insert_user_with_email(&repos, &format!("{}@example.com", unique("e"))).await;
    let status = catalog::create::<taskman_shared::models::Status, _>(&*repos.statuses, &unique("status"))
        .await
        .unwrap();
    let label = catalog::create::<taskman_shared::models::Label, _>(&*repos.labels, &unique("label"))
        .await
        .unwrap();

    let mut draft = common::draft("Assigned", status.id, &[label.id, i64::MAX]);
    draft.executor_id = Some(executor.id);
    let assigned = tasks::create(&repos, creator.id, draft).await.unwrap();
    let plain = tasks::create(&repos, creator.id, common::draft("Plain", status.id, &[]))
        .await
        .unwrap();

    assert_eq!(
        repos.tasks.label_ids(assigned.id).await.unwrap(),
        BTreeSet::from([label.id])
    );

    let filter = TaskFilter::all()
        .with_status(status.id)
        .with_executor(executor.id)
        .with_label(label.id)
        .created_by(creator.id);
    let found = tasks::list(&repos, &filter).await.unwrap();
    assert_eq!(found.iter().map(|t| t.id()).collect::<Vec<_>>(), vec![assigned.id]);
    assert_eq!(found[0].executor.as_ref().map(|e| e.id), Some(executor.id));
    assert_eq!(found[0].labels.len(), 1);

    let by_status = tasks::list(&repos, &TaskFilter::all().with_status(status.id)).await.unwrap();
    assert_eq!(
        by_status.iter().map(|t| t.id()).collect::<Vec<_>>(),
        vec![assigned.id, plain.id]
    );

    // Referenced rows are guarded
    let err = catalog::delete::<taskman_shared::models::Label, _, _>(&*repos.labels, &*repos.tasks, label.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ReferentialConflict { .. }));
    assert_eq!(
        repos.tasks.count_references(TaskReference::User(executor.id)).await.unwrap(),
        1
    );

    // Replacing with the empty set frees the label
    tasks::update(
        &repos,
        executor.id,
        assigned.id,
        common::draft("Assigned", status.id, &[]).into_patch(),
    )
    .await
    .unwrap();
    assert!(repos.tasks.label_ids(assigned.id).await.unwrap().is_empty());
    catalog::delete::<taskman_shared::models::Label, _, _>(&*repos.labels, &*repos.tasks, label.id)
        .await
        .unwrap();

    for task in [assigned, plain] {
        tasks::delete(&repos, creator.id, task.id).await.unwrap();
    }
    catalog::delete::<taskman_shared::models::Status, _, _>(&*repos.statuses, &*repos.tasks, status.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_restrict_foreign_key_blocks_raw_delete() {
    let Some(repos) = repositories().await else {
        return;
    };
    let creator = common::insert_user_with_email(&repos, &format!("{}@example.com", unique("r"))).await;
    let status = catalog::create::<taskman_shared::models::Status, _>(&*repos.statuses, &unique("status"))
        .await
        .unwrap();
    let task = tasks::create(&repos, creator.id, common::draft("Blocker", status.id, &[]))
        .await
        .unwrap();

    // Bypass the guard and hit the schema directly
    let err = repos.statuses.delete(status.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::StillReferenced { .. }));

    tasks::delete(&repos, creator.id, task.id).await.unwrap();
    assert!(repos.statuses.delete(status.id).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_email_is_reported_on_field() {
    let Some(repos) = repositories().await else {
        return;
    };
    let email = format!("{}@example.com", unique("dup"));
    common::insert_user_with_email(&repos, &email).await;

    let err = repos
        .users
        .insert(taskman_shared::models::NewUser {
            first_name: "Again".to_string(),
            last_name: "Tester".to_string(),
            email,
            password_digest: "x".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueViolation { ref field } if field == "email"));
}
