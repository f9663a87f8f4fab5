//! Referential consistency: foreign-key existence, parent-chain cycles, and
//! the delete policy for every relation between tables.

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    application::Application, contact::Contact, event::Event, interview::Interview,
    reminder::Reminder, resource::Resource, resume, resume_template::ResumeSection, task::Task,
};
use crate::store::{Entity, Field, OnDelete, Relation, Store, Table};

const fn relation(parent: Table, child: Table, fk: Field, on_delete: OnDelete) -> Relation {
    Relation {
        parent,
        child,
        fk,
        on_delete,
    }
}

/// Every foreign key in the schema and what happens to the child when its
/// parent is deleted. The Postgres migration declares the same actions.
pub const RELATIONS: &[Relation] = &[
    relation(Table::Companies, Table::Applications, Application::COMPANY_ID, OnDelete::Cascade),
    relation(Table::Companies, Table::Contacts, Contact::COMPANY_ID, OnDelete::Cascade),
    relation(Table::Applications, Table::Interviews, Interview::APPLICATION_ID, OnDelete::Cascade),
    relation(Table::Applications, Table::Reminders, Reminder::APPLICATION_ID, OnDelete::Cascade),
    relation(Table::Applications, Table::Events, Event::APPLICATION_ID, OnDelete::Cascade),
    // A referral survives its referrer; isReferred is left as the user set it.
    relation(Table::Contacts, Table::Applications, Application::REFERRED_BY_ID, OnDelete::Nullify),
    relation(Table::Contacts, Table::Events, Event::CONTACT_ID, OnDelete::Nullify),
    relation(Table::Tasks, Table::Tasks, Task::PARENT_TASK_ID, OnDelete::Cascade),
    relation(Table::Resources, Table::Resources, Resource::PARENT_ID, OnDelete::Cascade),
    relation(Table::Resumes, Table::Experiences, resume::RESUME_ID, OnDelete::Cascade),
    relation(Table::Resumes, Table::Projects, resume::RESUME_ID, OnDelete::Cascade),
    relation(Table::Resumes, Table::SkillCategories, resume::RESUME_ID, OnDelete::Cascade),
    relation(Table::Resumes, Table::Educations, resume::RESUME_ID, OnDelete::Cascade),
    relation(Table::ResumeTemplates, Table::ResumeSections, ResumeSection::TEMPLATE_ID, OnDelete::Cascade),
];

/// Fails with a validation error naming `field` when `id` has no row in `table`.
pub async fn ensure_exists(
    store: &Store,
    table: Table,
    id: Uuid,
    field: &str,
) -> Result<(), AppError> {
    if store.exists(table, id).await? {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "{field} references a {} that does not exist: {id}",
            table.label()
        )))
    }
}

/// Like [`ensure_exists`] for an optional reference; `None` always passes.
pub async fn ensure_optional(
    store: &Store,
    table: Table,
    id: Option<Uuid>,
    field: &str,
) -> Result<(), AppError> {
    match id {
        Some(id) => ensure_exists(store, table, id, field).await,
        None => Ok(()),
    }
}

/// Walks the ancestor chain starting at `parent` and rejects it if it reaches
/// `id` (the row being written), or if any ancestor is missing.
pub async fn ensure_acyclic<E, F>(
    store: &Store,
    id: Uuid,
    parent: Option<Uuid>,
    parent_of: F,
    field: &str,
) -> Result<(), AppError>
where
    E: Entity,
    F: Fn(&E) -> Option<Uuid>,
{
    let mut seen = HashSet::from([id]);
    let mut cursor = parent;
    while let Some(ancestor) = cursor {
        if !seen.insert(ancestor) {
            return Err(AppError::Validation(format!(
                "{field} would make this {} its own ancestor",
                E::TABLE.label()
            )));
        }
        let row: E = store.get(ancestor).await?.ok_or_else(|| {
            AppError::Validation(format!(
                "{field} references a {} that does not exist: {ancestor}",
                E::TABLE.label()
            ))
        })?;
        cursor = parent_of(&row);
    }
    Ok(())
}

/// Deletes a row and everything the relation table says goes with it.
pub async fn delete(store: &Store, table: Table, id: Uuid) -> Result<(), AppError> {
    if !store.delete(table, id, RELATIONS).await? {
        return Err(AppError::not_found(table.label(), id));
    }
    info!("Deleted {} {id}", table.label());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{Task, TaskPatch};
    use chrono::Utc;

    async fn insert_task(store: &Store, parent: Option<Uuid>) -> Task {
        let task = Task::create(
            TaskPatch {
                title: Some("t".into()),
                due_date: Some(Utc::now()),
                parent_task_id: Some(parent),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        store.insert(&task).await.unwrap();
        task
    }

    #[test]
    fn test_every_relation_points_at_a_child_column() {
        for relation in RELATIONS {
            assert!(relation.fk.column.ends_with("_id"), "{:?}", relation);
        }
    }

    #[tokio::test]
    async fn test_missing_reference_is_validation_error() {
        let store = Store::in_memory();
        let err = ensure_exists(&store, Table::Companies, Uuid::new_v4(), "companyId")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("companyId")));
        assert!(ensure_optional(&store, Table::Contacts, None, "referredById").await.is_ok());
    }

    #[tokio::test]
    async fn test_reparent_under_own_descendant_rejected() {
        let store = Store::in_memory();
        let root = insert_task(&store, None).await;
        let child = insert_task(&store, Some(root.id)).await;
        let grandchild = insert_task(&store, Some(child.id)).await;

        let result = ensure_acyclic::<Task, _>(
            &store,
            root.id,
            Some(grandchild.id),
            |t| t.parent_task_id,
            "parentTaskId",
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let sibling = insert_task(&store, None).await;
        assert!(ensure_acyclic::<Task, _>(
            &store,
            sibling.id,
            Some(grandchild.id),
            |t| t.parent_task_id,
            "parentTaskId",
        )
        .await
        .is_ok());
    }

    #[tokio::test]
    async fn test_delete_unknown_row_is_not_found() {
        let store = Store::in_memory();
        let err = delete(&store, Table::Tasks, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_task_takes_subtasks() {
        let store = Store::in_memory();
        let root = insert_task(&store, None).await;
        let child = insert_task(&store, Some(root.id)).await;

        delete(&store, Table::Tasks, root.id).await.unwrap();
        assert!(!store.exists(Table::Tasks, child.id).await.unwrap());
    }
}
