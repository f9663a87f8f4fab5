use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_acyclic};
use crate::derivation;
use crate::errors::AppError;
use crate::filters::TaskFilter;
use crate::models::task::{Task, TaskPatch};
use crate::services::{fetch, load_children};
use crate::store::{Store, Table};

#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Task>,
}

async fn views(store: &Store, tasks: Vec<Task>) -> Result<Vec<TaskView>, AppError> {
    let ids = tasks.iter().map(|t| t.id).collect();
    let mut subtasks = load_children::<Task, _>(store, Task::PARENT_TASK_ID, ids, |t| {
        t.parent_task_id
    })
    .await?;
    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            subtasks: subtasks.remove(&task.id).unwrap_or_default(),
            task,
        })
        .collect())
}

async fn view(store: &Store, task: Task) -> Result<TaskView, AppError> {
    views(store, vec![task])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("task view went missing")))
}

/// Top-level tasks, each with its subtasks.
pub async fn list(store: &Store, filter: &TaskFilter) -> Result<Vec<TaskView>, AppError> {
    let tasks = store.list(&filter.query()?).await?;
    views(store, tasks).await
}

pub async fn get(store: &Store, id: Uuid) -> Result<TaskView, AppError> {
    let task = fetch(store, id).await?;
    view(store, task).await
}

pub async fn create(store: &Store, patch: TaskPatch) -> Result<TaskView, AppError> {
    let now = Utc::now();
    let task = Task::create(derivation::task(patch, now), now)?;
    ensure_acyclic::<Task, _>(store, task.id, task.parent_task_id, |t| t.parent_task_id, "parentTaskId")
        .await?;

    store.insert(&task).await?;
    match task.parent_task_id {
        Some(parent) => info!("Created subtask {} under {parent}", task.id),
        None => info!("Created task {}", task.id),
    }
    view(store, task).await
}

pub async fn update(store: &Store, id: Uuid, patch: TaskPatch) -> Result<TaskView, AppError> {
    let now = Utc::now();
    let patch = derivation::task(patch, now);
    let mut task: Task = fetch(store, id).await?;
    if let Some(parent) = patch.parent_task_id {
        ensure_acyclic::<Task, _>(store, id, parent, |t| t.parent_task_id, "parentTaskId").await?;
    }

    task.apply(patch, now)?;
    if !store.update(&task).await? {
        return Err(AppError::not_found("task", id));
    }
    view(store, task).await
}

/// Subtasks go with their parent.
pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Tasks, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};

    fn due(title: &str, due_date: DateTime<Utc>, parent: Option<Uuid>) -> TaskPatch {
        TaskPatch {
            title: Some(title.into()),
            due_date: Some(due_date),
            parent_task_id: Some(parent),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_top_level_list_embeds_subtasks() {
        let store = Store::in_memory();
        let d = Utc::now();
        let a = create(&store, due("A", d, None)).await.unwrap();
        let b = create(&store, due("B", d, Some(a.task.id))).await.unwrap();

        let listed = list(&store, &TaskFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].task.id, a.task.id);
        assert_eq!(listed[0].subtasks.len(), 1);
        assert_eq!(listed[0].subtasks[0].id, b.task.id);
    }

    #[tokio::test]
    async fn test_completion_toggle_pairs_timestamp() {
        let store = Store::in_memory();
        let created = create(&store, due("Write cover letter", Utc::now(), None))
            .await
            .unwrap();

        let before = Utc::now();
        let done = update(
            &store,
            created.task.id,
            TaskPatch {
                is_completed: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let stamped = done.task.completed_at.unwrap();
        assert!(stamped >= before && stamped <= Utc::now());

        let undone = update(
            &store,
            created.task.id,
            TaskPatch {
                is_completed: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(!undone.task.is_completed);
        assert!(undone.task.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_cannot_reparent_under_own_subtask() {
        let store = Store::in_memory();
        let parent = create(&store, due("Parent", Utc::now(), None)).await.unwrap();
        let child = create(&store, due("Child", Utc::now(), Some(parent.task.id)))
            .await
            .unwrap();

        let err = update(
            &store,
            parent.task.id,
            TaskPatch {
                parent_task_id: Some(Some(child.task.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let unchanged = get(&store, parent.task.id).await.unwrap();
        assert_eq!(unchanged.task.parent_task_id, None);
    }

    #[tokio::test]
    async fn test_unknown_parent_is_rejected() {
        let store = Store::in_memory();
        let err = create(&store, due("Orphan", Utc::now(), Some(Uuid::new_v4())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("parentTaskId")));
    }

    #[tokio::test]
    async fn test_date_filter_selects_one_local_day() {
        let store = Store::in_memory();
        let today = Local::now().date_naive();
        let noon = Local
            .from_local_datetime(&today.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()))
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        create(&store, due("Today", noon, None)).await.unwrap();
        create(&store, due("Tomorrow", noon + Duration::days(1), None))
            .await
            .unwrap();

        let filter = TaskFilter { date: Some(today) };
        let listed = list(&store, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].task.title, "Today");
    }

    #[tokio::test]
    async fn test_deleting_parent_removes_subtasks() {
        let store = Store::in_memory();
        let parent = create(&store, due("Parent", Utc::now(), None)).await.unwrap();
        let child = create(&store, due("Child", Utc::now(), Some(parent.task.id)))
            .await
            .unwrap();

        delete(&store, parent.task.id).await.unwrap();
        assert!(matches!(
            get(&store, child.task.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reparenting_missing_task_is_not_found() {
        let store = Store::in_memory();
        let parent = create(&store, due("Parent", Utc::now(), None)).await.unwrap();

        let err = update(
            &store,
            Uuid::new_v4(),
            TaskPatch {
                parent_task_id: Some(Some(parent.task.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
