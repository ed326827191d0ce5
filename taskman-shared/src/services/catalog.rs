//! Statuses and labels
//!
//! Both are a unique, non-empty name that tasks refer to, so one set of
//! generic use cases serves both through [`CatalogEntity`].

use tracing::info;
use validator::Validate;

use super::guards;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Entity, Label, LabelPatch, NewLabel, NewStatus, Status, StatusPatch, TaskReference};
use crate::repository::{Repository, TaskRepository};

/// An entity that is nothing but a name
pub trait CatalogEntity: Entity {
    fn name(&self) -> &str;

    fn draft(name: String) -> Self::New;

    fn rename(name: String) -> Self::Patch;

    fn reference(id: i64) -> TaskReference;
}

impl CatalogEntity for Status {
    fn name(&self) -> &str {
        &self.name
    }

    fn draft(name: String) -> NewStatus {
        NewStatus { name }
    }

    fn rename(name: String) -> StatusPatch {
        StatusPatch { name: Some(name) }
    }

    fn reference(id: i64) -> TaskReference {
        TaskReference::Status(id)
    }
}

impl CatalogEntity for Label {
    fn name(&self) -> &str {
        &self.name
    }

    fn draft(name: String) -> NewLabel {
        NewLabel { name }
    }

    fn rename(name: String) -> LabelPatch {
        LabelPatch { name: Some(name) }
    }

    fn reference(id: i64) -> TaskReference {
        TaskReference::Label(id)
    }
}

pub async fn list<E, R>(repo: &R) -> ServiceResult<Vec<E>>
where
    E: CatalogEntity,
    R: Repository<E> + ?Sized,
{
    Ok(repo.list().await?)
}

pub async fn get<E, R>(repo: &R, id: i64) -> ServiceResult<E>
where
    E: CatalogEntity,
    R: Repository<E> + ?Sized,
{
    repo.find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(E::KIND, id))
}

pub async fn create<E, R>(repo: &R, name: &str) -> ServiceResult<E>
where
    E: CatalogEntity,
    E::New: Validate,
    R: Repository<E> + ?Sized,
{
    let new = E::draft(name.trim().to_string());
    new.validate()?;

    let created = repo.insert(new).await?;
    info!(kind = %E::KIND, id = created.id(), "Created");
    Ok(created)
}

pub async fn rename<E, R>(repo: &R, id: i64, name: &str) -> ServiceResult<E>
where
    E: CatalogEntity,
    E::Patch: Validate,
    R: Repository<E> + ?Sized,
{
    let patch = E::rename(name.trim().to_string());
    patch.validate()?;

    let updated = repo
        .update(id, patch)
        .await?
        .ok_or_else(|| ServiceError::not_found(E::KIND, id))?;
    info!(kind = %E::KIND, id, "Renamed");
    Ok(updated)
}

/// Deletes unless a task still uses the entity
pub async fn delete<E, R, T>(repo: &R, tasks: &T, id: i64) -> ServiceResult<E>
where
    E: CatalogEntity,
    R: Repository<E> + ?Sized,
    T: TaskRepository + ?Sized,
{
    guards::delete_guarded(repo, tasks, E::reference(id)).await
}
