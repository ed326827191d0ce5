//! Task use cases: label association, ownership and validation

mod common;

use common::{draft, ids, world};
use taskman_shared::filter::TaskFilter;
use taskman_shared::models::{EntityKind, TaskPatch};
use taskman_shared::repository::{Repository, TaskRepository};
use taskman_shared::services::tasks;
use taskman_shared::ServiceError;

#[tokio::test]
async fn test_create_associates_existing_labels_only() {
    let w = world().await;
    let (bug, feature) = (w.labels[0].id, w.labels[1].id);

    let task = tasks::create(&w.repos, w.creator.id, draft("Fix login", w.status.id, &[bug, feature, 99]))
        .await
        .unwrap();

    assert_eq!(task.creator_id, w.creator.id);
    assert_eq!(w.repos.tasks.label_ids(task.id).await.unwrap(), ids(&[bug, feature]));
}

#[tokio::test]
async fn test_update_replaces_label_set() {
    let w = world().await;
    let (l1, l2, l3) = (w.labels[0].id, w.labels[1].id, w.labels[2].id);
    let task = tasks::create(&w.repos, w.creator.id, draft("Fix login", w.status.id, &[l1, l2]))
        .await
        .unwrap();

    let patch = draft("Fix login", w.status.id, &[l2, l3, 99]).into_patch();
    tasks::update(&w.repos, w.creator.id, task.id, patch).await.unwrap();

    assert_eq!(w.repos.tasks.label_ids(task.id).await.unwrap(), ids(&[l2, l3]));
}

#[tokio::test]
async fn test_repeated_identical_update_is_idempotent() {
    let w = world().await;
    let (l1, l3) = (w.labels[0].id, w.labels[2].id);
    let task = tasks::create(&w.repos, w.creator.id, draft("Docs", w.status.id, &[]))
        .await
        .unwrap();

    for _ in 0..2 {
        let patch = draft("Docs", w.status.id, &[l1, l3]).into_patch();
        tasks::update(&w.repos, w.creator.id, task.id, patch).await.unwrap();
        assert_eq!(w.repos.tasks.label_ids(task.id).await.unwrap(), ids(&[l1, l3]));
    }
}

#[tokio::test]
async fn test_patch_without_labels_keeps_associations() {
    let w = world().await;
    let l1 = w.labels[0].id;
    let task = tasks::create(&w.repos, w.creator.id, draft("Docs", w.status.id, &[l1]))
        .await
        .unwrap();

    let updated = tasks::update(
        &w.repos,
        w.other.id,
        task.id,
        TaskPatch {
            name: Some("Docs v2".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.name, "Docs v2");
    assert_eq!(updated.creator_id, w.creator.id);
    assert_eq!(w.repos.tasks.label_ids(task.id).await.unwrap(), ids(&[l1]));
}

#[tokio::test]
async fn test_invalid_update_changes_nothing() {
    let w = world().await;
    let l1 = w.labels[0].id;
    let task = tasks::create(&w.repos, w.creator.id, draft("Docs", w.status.id, &[l1]))
        .await
        .unwrap();

    let mut patch = draft("", w.status.id, &[]).into_patch();
    patch.executor_id = Some(Some(404));
    let err = tasks::update(&w.repos, w.creator.id, task.id, patch).await.unwrap_err();

    match err {
        ServiceError::Validation(errors) => {
            assert!(errors.has_field("name"));
            assert!(errors.has_field("executor_id"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let stored = tasks::get(&w.repos, task.id).await.unwrap();
    assert_eq!(stored.name, "Docs");
    assert_eq!(w.repos.tasks.label_ids(task.id).await.unwrap(), ids(&[l1]));
}

#[tokio::test]
async fn test_create_requires_existing_status() {
    let w = world().await;

    let err = tasks::create(&w.repos, w.creator.id, draft("Orphan", 42, &[]))
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation(errors) => assert!(errors.has_field("status_id")),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = tasks::create(
        &w.repos,
        w.creator.id,
        taskman_shared::services::tasks::TaskDraft {
            status_id: None,
            ..draft("No status", 0, &[])
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(w.repos.tasks.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_removes_join_rows() {
    let w = world().await;
    let (l1, l2) = (w.labels[0].id, w.labels[1].id);
    let task = tasks::create(&w.repos, w.creator.id, draft("Temp", w.status.id, &[l1, l2]))
        .await
        .unwrap();

    tasks::delete(&w.repos, w.creator.id, task.id).await.unwrap();

    assert!(w.repos.tasks.label_ids(task.id).await.unwrap().is_empty());
    assert!(matches!(
        tasks::get(&w.repos, task.id).await,
        Err(ServiceError::NotFound {
            kind: EntityKind::Task,
            ..
        })
    ));
    // The labels themselves are now free to go
    assert_eq!(
        w.repos
            .tasks
            .count_references(taskman_shared::models::TaskReference::Label(l1))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_non_creator_cannot_delete() {
    let w = world().await;
    let task = tasks::create(&w.repos, w.creator.id, draft("Mine", w.status.id, &[]))
        .await
        .unwrap();

    let err = tasks::delete(&w.repos, w.other.id, task.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Authorization(_)));

    let still_there = tasks::get(&w.repos, task.id).await.unwrap();
    assert_eq!(still_there.creator_id, w.creator.id);
}

#[tokio::test]
async fn test_delete_missing_task() {
    let w = world().await;
    let err = tasks::delete(&w.repos, w.creator.id, 12345).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { id: 12345, .. }));
}

#[tokio::test]
async fn test_listing_resolves_relations_and_filters() {
    let w = world().await;
    let l1 = w.labels[0].id;
    let mut assigned = draft("Assigned", w.status.id, &[l1]);
    assigned.executor_id = Some(w.other.id);
    let first = tasks::create(&w.repos, w.creator.id, assigned).await.unwrap();
    let second = tasks::create(&w.repos, w.other.id, draft("Other's", w.status.id, &[]))
        .await
        .unwrap();

    let all = tasks::list(&w.repos, &TaskFilter::all()).await.unwrap();
    assert_eq!(all.iter().map(|t| t.id()).collect::<Vec<_>>(), vec![first.id, second.id]);
    assert_eq!(all[0].status_name, "new");
    assert_eq!(all[0].creator.full_name, "Creator Tester");
    assert_eq!(all[0].executor.as_ref().map(|e| e.id), Some(w.other.id));
    assert_eq!(all[0].labels[0].name, "bug");

    let mine = tasks::list(&w.repos, &TaskFilter::all().created_by(w.other.id)).await.unwrap();
    assert_eq!(mine.iter().map(|t| t.id()).collect::<Vec<_>>(), vec![second.id]);

    let labelled = tasks::list(&w.repos, &TaskFilter::all().with_label(l1)).await.unwrap();
    assert_eq!(labelled.len(), 1);

    let details = tasks::get_details(&w.repos, first.id).await.unwrap();
    assert_eq!(details.label_ids(), ids(&[l1]));
}
