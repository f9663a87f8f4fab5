use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required, required_text};
use crate::payload::{date, nullable};
use crate::store::{Entity, Field, Order, SqlValue, Table};

text_enum!(InterviewStatus {
    Scheduled => "SCHEDULED",
    Completed => "COMPLETED",
    Cancelled => "CANCELLED",
    Rescheduled => "RESCHEDULED",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: Uuid,
    pub application_id: Uuid,
    pub round: i32,
    pub title: String,
    pub interview_date: DateTime<Utc>,
    /// Minutes.
    pub duration: Option<i32>,
    pub interviewers: Option<String>,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub status: InterviewStatus,
    pub feedback: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interview {
    pub const APPLICATION_ID: Field = Field::new("application_id", "applicationId");
    pub const INTERVIEW_DATE: Field = Field::new("interview_date", "interviewDate");

    pub fn create(patch: InterviewPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut interview = Interview {
            id: Uuid::new_v4(),
            application_id: required(patch.application_id, "applicationId")?,
            round: 1,
            title: required_text(patch.title.clone(), "title")?,
            interview_date: required(patch.interview_date, "interviewDate")?,
            duration: None,
            interviewers: None,
            location: None,
            meeting_link: None,
            status: InterviewStatus::Scheduled,
            feedback: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        interview.apply(patch, now)?;
        Ok(interview)
    }

    pub fn apply(&mut self, patch: InterviewPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.application_id, patch.application_id);
        merge(&mut self.round, patch.round);
        if let Some(title) = patch.title {
            self.title = non_blank(title, "title")?;
        }
        merge(&mut self.interview_date, patch.interview_date);
        merge(&mut self.duration, patch.duration);
        merge(&mut self.interviewers, patch.interviewers);
        merge(&mut self.location, patch.location);
        merge(&mut self.meeting_link, patch.meeting_link);
        merge(&mut self.status, patch.status);
        merge(&mut self.feedback, patch.feedback);
        merge(&mut self.notes, patch.notes);
        self.updated_at = now;

        if self.round < 1 {
            return Err(AppError::Validation("round must be at least 1".to_string()));
        }
        if self.duration.is_some_and(|minutes| minutes < 0) {
            return Err(AppError::Validation("duration cannot be negative".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPatch {
    pub application_id: Option<Uuid>,
    pub round: Option<i32>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "date")]
    pub interview_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub interviewers: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub meeting_link: Option<Option<String>>,
    pub status: Option<InterviewStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub feedback: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl Entity for Interview {
    const TABLE: Table = Table::Interviews;
    const ORDER: &'static [Order] = &[Order::asc(Self::INTERVIEW_DATE)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("application_id", self.application_id.into()),
            ("round", self.round.into()),
            ("title", self.title.clone().into()),
            ("interview_date", self.interview_date.into()),
            ("duration", self.duration.into()),
            ("interviewers", self.interviewers.clone().into()),
            ("location", self.location.clone().into()),
            ("meeting_link", self.meeting_link.clone().into()),
            ("status", self.status.into()),
            ("feedback", self.feedback.clone().into()),
            ("notes", self.notes.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}
