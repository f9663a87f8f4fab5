//! Per-entity operations: list/get with includes, create and update through
//! the derivation rules and reference checks, delete through the relation
//! table. Handlers stay thin and call straight into these.

pub mod applications;
pub mod companies;
pub mod contacts;
pub mod email_templates;
pub mod events;
pub mod interviews;
pub mod learning;
pub mod reminders;
pub mod resources;
pub mod resume_templates;
pub mod resumes;
pub mod tasks;

use std::collections::HashMap;

use uuid::Uuid;

use crate::errors::AppError;
use crate::store::{Entity, Field, Query, Store, ID};

/// Loads one row or fails with `NotFound`.
pub async fn fetch<E: Entity>(store: &Store, id: Uuid) -> Result<E, AppError> {
    store
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(E::TABLE.label(), id))
}

/// Loads the rows with the given ids, keyed by id. Duplicates and `None`s are fine.
pub async fn load_by_ids<E: Entity>(
    store: &Store,
    ids: impl IntoIterator<Item = Option<Uuid>>,
) -> Result<HashMap<Uuid, E>, AppError> {
    let mut ids: Vec<Uuid> = ids.into_iter().flatten().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<E> = store.list(&Query::new().one_of(ID, ids)).await?;
    Ok(rows.into_iter().map(|row| (row.id(), row)).collect())
}

/// Loads every child whose `fk` is one of `parents`, grouped by parent id.
/// Each group keeps the child entity's default order.
pub async fn load_children<E, F>(
    store: &Store,
    fk: Field,
    parents: Vec<Uuid>,
    parent_of: F,
) -> Result<HashMap<Uuid, Vec<E>>, AppError>
where
    E: Entity,
    F: Fn(&E) -> Option<Uuid>,
{
    if parents.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<E> = store.list(&Query::new().one_of(fk, parents)).await?;
    let mut grouped: HashMap<Uuid, Vec<E>> = HashMap::new();
    for row in rows {
        if let Some(parent) = parent_of(&row) {
            grouped.entry(parent).or_default().push(row);
        }
    }
    Ok(grouped)
}
