use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required, required_text};
use crate::payload::{date, nullable, nullable_date};
use crate::store::{Entity, Field, Order, SqlValue, Table};

/// A to-do item. Subtasks point at their parent through `parent_task_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub parent_task_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub const DUE_DATE: Field = Field::new("due_date", "dueDate");
    pub const PARENT_TASK_ID: Field = Field::new("parent_task_id", "parentTaskId");

    pub fn create(patch: TaskPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut task = Task {
            id: Uuid::new_v4(),
            title: required_text(patch.title.clone(), "title")?,
            notes: None,
            due_date: required(patch.due_date, "dueDate")?,
            is_completed: false,
            completed_at: None,
            parent_task_id: None,
            created_at: now,
            updated_at: now,
        };
        task.apply(patch, now)?;
        Ok(task)
    }

    pub fn apply(&mut self, patch: TaskPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(title) = patch.title {
            self.title = non_blank(title, "title")?;
        }
        merge(&mut self.notes, patch.notes);
        merge(&mut self.due_date, patch.due_date);
        merge(&mut self.is_completed, patch.is_completed);
        merge(&mut self.completed_at, patch.completed_at);
        merge(&mut self.parent_task_id, patch.parent_task_id);
        self.updated_at = now;

        if self.parent_task_id == Some(self.id) {
            return Err(AppError::Validation(
                "parentTaskId cannot reference the task itself".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "date")]
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent_task_id: Option<Option<Uuid>>,
}

impl Entity for Task {
    const TABLE: Table = Table::Tasks;
    const ORDER: &'static [Order] = &[Order::asc(Self::DUE_DATE)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("title", self.title.clone().into()),
            ("notes", self.notes.clone().into()),
            ("due_date", self.due_date.into()),
            ("is_completed", self.is_completed.into()),
            ("completed_at", self.completed_at.into()),
            ("parent_task_id", self.parent_task_id.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}
