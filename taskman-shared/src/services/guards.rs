//! Deletion guards
//!
//! Statuses, labels and users cannot be deleted while a task points at
//! them. The check here runs before the delete; the restrict foreign keys in
//! the schema catch a task created between the check and the delete, and
//! that case is reported the same way.

use tracing::{info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{Entity, TaskReference};
use crate::repository::{Repository, RepositoryError, TaskRepository};

/// Fails with `ReferentialConflict` when any task depends on `reference`
pub async fn ensure_unreferenced<T>(tasks: &T, reference: TaskReference) -> ServiceResult<()>
where
    T: TaskRepository + ?Sized,
{
    let dependents = tasks.count_references(reference).await?;
    if dependents > 0 {
        warn!(
            kind = %reference.kind(),
            id = reference.id(),
            dependents,
            "Refusing to delete a row that tasks depend on"
        );
        return Err(ServiceError::ReferentialConflict {
            kind: reference.kind(),
            id: reference.id(),
        });
    }
    Ok(())
}

/// Deletes the row behind `reference` if it exists and nothing depends on it
///
/// Returns the deleted entity.
pub async fn delete_guarded<E, R, T>(
    repo: &R,
    tasks: &T,
    reference: TaskReference,
) -> ServiceResult<E>
where
    E: Entity,
    R: Repository<E> + ?Sized,
    T: TaskRepository + ?Sized,
{
    let id = reference.id();
    let entity = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(E::KIND, id))?;

    ensure_unreferenced(tasks, reference).await?;

    match repo.delete(id).await {
        Ok(true) => {
            info!(kind = %E::KIND, id, "Deleted");
            Ok(entity)
        }
        Ok(false) => Err(ServiceError::not_found(E::KIND, id)),
        Err(err @ RepositoryError::StillReferenced { .. }) => {
            warn!(kind = %E::KIND, id, "Delete blocked by a concurrently created task");
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}
