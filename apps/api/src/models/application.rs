use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required, required_text};
use crate::payload::{nullable, nullable_date};
use crate::store::{Entity, Field, Order, SqlValue, Table, CREATED_AT};

text_enum!(ApplicationStatus {
    NotApplied => "NOT_APPLIED",
    Applied => "APPLIED",
    InReview => "IN_REVIEW",
    InterviewScheduled => "INTERVIEW_SCHEDULED",
    Interviewing => "INTERVIEWING",
    Offer => "OFFER",
    Accepted => "ACCEPTED",
    Rejected => "REJECTED",
    Withdrawn => "WITHDRAWN",
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub company_id: Uuid,
    pub position_title: String,
    pub job_url: Option<String>,
    pub job_description: Option<String>,
    pub location: Option<String>,
    pub status: ApplicationStatus,
    pub applied_date: Option<DateTime<Utc>>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    /// Reference returned by file storage, never the file itself.
    pub resume_path: String,
    pub cover_letter_path: Option<String>,
    pub is_referred: bool,
    pub referred_by_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub const COMPANY_ID: Field = Field::new("company_id", "companyId");
    pub const STATUS: Field = Field::new("status", "status");
    pub const REFERRED_BY_ID: Field = Field::new("referred_by_id", "referredById");

    pub fn create(patch: ApplicationPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut application = Application {
            id: Uuid::new_v4(),
            company_id: required(patch.company_id, "companyId")?,
            position_title: required_text(patch.position_title.clone(), "positionTitle")?,
            job_url: None,
            job_description: None,
            location: None,
            status: ApplicationStatus::NotApplied,
            applied_date: None,
            application_deadline: None,
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            resume_path: required_text(patch.resume_path.clone(), "resumePath")?,
            cover_letter_path: None,
            is_referred: false,
            referred_by_id: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        application.apply(patch, now)?;
        Ok(application)
    }

    pub fn apply(&mut self, patch: ApplicationPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.company_id, patch.company_id);
        if let Some(title) = patch.position_title {
            self.position_title = non_blank(title, "positionTitle")?;
        }
        merge(&mut self.job_url, patch.job_url);
        merge(&mut self.job_description, patch.job_description);
        merge(&mut self.location, patch.location);
        merge(&mut self.status, patch.status);
        merge(&mut self.applied_date, patch.applied_date);
        merge(&mut self.application_deadline, patch.application_deadline);
        merge(&mut self.salary_min, patch.salary_min);
        merge(&mut self.salary_max, patch.salary_max);
        merge(&mut self.salary_currency, patch.salary_currency);
        if let Some(path) = patch.resume_path {
            self.resume_path = non_blank(path, "resumePath")?;
        }
        merge(&mut self.cover_letter_path, patch.cover_letter_path);
        merge(&mut self.is_referred, patch.is_referred);
        merge(&mut self.referred_by_id, patch.referred_by_id);
        merge(&mut self.notes, patch.notes);
        self.updated_at = now;
        self.validate()
    }

    fn validate(&self) -> Result<(), AppError> {
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                return Err(AppError::Validation(
                    "salaryMin cannot exceed salaryMax".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPatch {
    pub company_id: Option<Uuid>,
    pub position_title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub job_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub job_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    pub status: Option<ApplicationStatus>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub applied_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub application_deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary_min: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary_max: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary_currency: Option<Option<String>>,
    pub resume_path: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub cover_letter_path: Option<Option<String>>,
    pub is_referred: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub referred_by_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
}

impl Entity for Application {
    const TABLE: Table = Table::Applications;
    const ORDER: &'static [Order] = &[Order::desc(CREATED_AT)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("company_id", self.company_id.into()),
            ("position_title", self.position_title.clone().into()),
            ("job_url", self.job_url.clone().into()),
            ("job_description", self.job_description.clone().into()),
            ("location", self.location.clone().into()),
            ("status", self.status.into()),
            ("applied_date", self.applied_date.into()),
            ("application_deadline", self.application_deadline.into()),
            ("salary_min", self.salary_min.into()),
            ("salary_max", self.salary_max.into()),
            ("salary_currency", self.salary_currency.clone().into()),
            ("resume_path", self.resume_path.clone().into()),
            ("cover_letter_path", self.cover_letter_path.clone().into()),
            ("is_referred", self.is_referred.into()),
            ("referred_by_id", self.referred_by_id.into()),
            ("notes", self.notes.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}
