//! Shared fixtures for service tests against the in-memory store

#![allow(dead_code)]

use std::collections::BTreeSet;

use taskman_shared::models::{Label, NewLabel, NewStatus, NewUser, Status, User};
use taskman_shared::repository::{Repositories, Repository};
use taskman_shared::services::tasks::TaskDraft;

pub struct World {
    pub repos: Repositories,
    /// Creates the tasks in most tests
    pub creator: User,
    /// Someone else
    pub other: User,
    pub status: Status,
    pub labels: Vec<Label>,
}

pub async fn insert_user(repos: &Repositories, first_name: &str) -> User {
    let email = format!("{}@example.com", first_name.to_lowercase());
    insert_named_user(repos, first_name, &email).await
}

pub async fn insert_user_with_email(repos: &Repositories, email: &str) -> User {
    insert_named_user(repos, "Someone", email).await
}

async fn insert_named_user(repos: &Repositories, first_name: &str, email: &str) -> User {
    repos
        .users
        .insert(NewUser {
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: email.to_string(),
            password_digest: "not-a-real-digest".to_string(),
        })
        .await
        .expect("Failed to insert user")
}

pub async fn world() -> World {
    let repos = Repositories::in_memory();
    let creator = insert_user(&repos, "Creator").await;
    let other = insert_user(&repos, "Other").await;
    let status = repos
        .statuses
        .insert(NewStatus {
            name: "new".to_string(),
        })
        .await
        .expect("Failed to insert status");

    let mut labels = Vec::new();
    for name in ["bug", "feature", "docs"] {
        labels.push(
            repos
                .labels
                .insert(NewLabel {
                    name: name.to_string(),
                })
                .await
                .expect("Failed to insert label"),
        );
    }

    World {
        repos,
        creator,
        other,
        status,
        labels,
    }
}

pub fn ids(values: &[i64]) -> BTreeSet<i64> {
    values.iter().copied().collect()
}

pub fn draft(name: &str, status_id: i64, label_ids: &[i64]) -> TaskDraft {
    TaskDraft {
        name: name.to_string(),
        description: None,
        status_id: Some(status_id),
        executor_id: None,
        label_ids: ids(label_ids),
    }
}
