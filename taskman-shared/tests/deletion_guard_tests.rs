//! Statuses, labels and users cannot be deleted while tasks use them

mod common;

use common::{draft, world};
use taskman_shared::models::{EntityKind, Label, Status};
use taskman_shared::services::{catalog, tasks, users};
use taskman_shared::ServiceError;

#[tokio::test]
async fn test_status_in_use_is_not_deleted() {
    let w = world().await;
    let task = tasks::create(&w.repos, w.creator.id, draft("Work", w.status.id, &[]))
        .await
        .unwrap();

    let err = catalog::delete::<Status, _, _>(&*w.repos.statuses, &*w.repos.tasks, w.status.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::ReferentialConflict {
            kind: EntityKind::Status,
            ..
        }
    ));
    assert_eq!(
        catalog::get::<Status, _>(&*w.repos.statuses, w.status.id).await.unwrap(),
        w.status
    );
    assert_eq!(tasks::get(&w.repos, task.id).await.unwrap().status_id, w.status.id);
}

#[tokio::test]
async fn test_unused_status_is_deleted() {
    let w = world().await;
    let spare = catalog::create::<Status, _>(&*w.repos.statuses, "spare").await.unwrap();

    let deleted = catalog::delete::<Status, _, _>(&*w.repos.statuses, &*w.repos.tasks, spare.id)
        .await
        .unwrap();

    assert_eq!(deleted.id, spare.id);
    assert!(matches!(
        catalog::get::<Status, _>(&*w.repos.statuses, spare.id).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_label_in_use_is_not_deleted() {
    let w = world().await;
    let label = w.labels[1].clone();
    tasks::create(&w.repos, w.creator.id, draft("Tagged", w.status.id, &[label.id]))
        .await
        .unwrap();

    let err = catalog::delete::<Label, _, _>(&*w.repos.labels, &*w.repos.tasks, label.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::ReferentialConflict {
            kind: EntityKind::Label,
            ..
        }
    ));
    assert!(catalog::get::<Label, _>(&*w.repos.labels, label.id).await.is_ok());
}

#[tokio::test]
async fn test_label_freed_after_task_update() {
    let w = world().await;
    let label = w.labels[0].clone();
    let task = tasks::create(&w.repos, w.creator.id, draft("Tagged", w.status.id, &[label.id]))
        .await
        .unwrap();
    tasks::update(
        &w.repos,
        w.creator.id,
        task.id,
        draft("Tagged", w.status.id, &[]).into_patch(),
    )
    .await
    .unwrap();

    assert!(catalog::delete::<Label, _, _>(&*w.repos.labels, &*w.repos.tasks, label.id)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_creator_and_executor_cannot_delete_account() {
    let w = world().await;
    let mut assigned = draft("Assigned", w.status.id, &[]);
    assigned.executor_id = Some(w.other.id);
    tasks::create(&w.repos, w.creator.id, assigned).await.unwrap();

    for user in [&w.creator, &w.other] {
        let err = users::delete_account(&w.repos, user.id, user.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::ReferentialConflict {
                kind: EntityKind::User,
                ..
            }
        ));
        assert!(users::get(&w.repos, user.id).await.is_ok());
    }
}

#[tokio::test]
async fn test_deleting_missing_rows_is_not_found() {
    let w = world().await;
    let err = catalog::delete::<Status, _, _>(&*w.repos.statuses, &*w.repos.tasks, 777)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::Status,
            id: 777
        }
    ));
}

#[tokio::test]
async fn test_catalog_validation() {
    let w = world().await;

    let err = catalog::create::<Status, _>(&*w.repos.statuses, "   ").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref e) if e.has_field("name")));

    let err = catalog::create::<Label, _>(&*w.repos.labels, "bug").await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ref e) if e.has_field("name")));

    let renamed = catalog::rename::<Label, _>(&*w.repos.labels, w.labels[0].id, " defect ")
        .await
        .unwrap();
    assert_eq!(renamed.name, "defect");
}
