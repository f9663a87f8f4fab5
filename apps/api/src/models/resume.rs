//! A resume and the ordered sections it owns.
//!
//! Child rows (experience, projects, skill categories, education) carry a
//! `resume_id` and a display `order`. `order` is not unique; equal values fall
//! back to creation order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{merge, non_blank, required, required_text};
use crate::payload::{nullable, nullable_date};
use crate::store::{Entity, Field, Order, SqlValue, Table, UPDATED_AT};

pub const RESUME_ID: Field = Field::new("resume_id", "resumeId");
pub const SORT_ORDER: Field = Field::new("sort_order", "order");

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: Uuid,
    pub name: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub website: Option<String>,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resume {
    pub fn create(patch: ResumePatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut resume = Resume {
            id: Uuid::new_v4(),
            name: required_text(patch.name.clone(), "name")?,
            full_name: None,
            email: None,
            phone: None,
            location: None,
            linkedin_url: None,
            github_url: None,
            website: None,
            summary: None,
            created_at: now,
            updated_at: now,
        };
        resume.apply(patch, now)?;
        Ok(resume)
    }

    pub fn apply(&mut self, patch: ResumePatch, now: DateTime<Utc>) -> Result<(), AppError> {
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        merge(&mut self.full_name, patch.full_name);
        merge(&mut self.email, patch.email);
        merge(&mut self.phone, patch.phone);
        merge(&mut self.location, patch.location);
        merge(&mut self.linkedin_url, patch.linkedin_url);
        merge(&mut self.github_url, patch.github_url);
        merge(&mut self.website, patch.website);
        merge(&mut self.summary, patch.summary);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub github_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub website: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub summary: Option<Option<String>>,
}

impl Entity for Resume {
    const TABLE: Table = Table::Resumes;
    const ORDER: &'static [Order] = &[Order::desc(UPDATED_AT)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("full_name", self.full_name.clone().into()),
            ("email", self.email.clone().into()),
            ("phone", self.phone.clone().into()),
            ("location", self.location.clone().into()),
            ("linkedin_url", self.linkedin_url.clone().into()),
            ("github_url", self.github_url.clone().into()),
            ("website", self.website.clone().into()),
            ("summary", self.summary.clone().into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

/// Rows owned by a resume.
pub trait ResumeChild: Entity {
    fn resume_id(&self) -> Uuid;
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub company: String,
    pub position: String,
    pub location: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_current: bool,
    pub description: Option<String>,
    pub highlights: Vec<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Experience {
    pub fn create(patch: ExperiencePatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut experience = Experience {
            id: Uuid::new_v4(),
            resume_id: required(patch.resume_id, "resumeId")?,
            company: required_text(patch.company.clone(), "company")?,
            position: required_text(patch.position.clone(), "position")?,
            location: None,
            start_date: None,
            end_date: None,
            is_current: false,
            description: None,
            highlights: Vec::new(),
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        experience.apply(patch, now)?;
        Ok(experience)
    }

    pub fn apply(&mut self, patch: ExperiencePatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.resume_id, patch.resume_id);
        if let Some(company) = patch.company {
            self.company = non_blank(company, "company")?;
        }
        if let Some(position) = patch.position {
            self.position = non_blank(position, "position")?;
        }
        merge(&mut self.location, patch.location);
        merge(&mut self.start_date, patch.start_date);
        merge(&mut self.end_date, patch.end_date);
        merge(&mut self.is_current, patch.is_current);
        merge(&mut self.description, patch.description);
        merge(&mut self.highlights, patch.highlights);
        merge(&mut self.sort_order, patch.sort_order);
        self.updated_at = now;
        check_date_range(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperiencePatch {
    pub resume_id: Option<Uuid>,
    pub company: Option<String>,
    pub position: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub is_current: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub highlights: Option<Vec<String>>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

impl Entity for Experience {
    const TABLE: Table = Table::Experiences;
    const ORDER: &'static [Order] = &[Order::asc(SORT_ORDER)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("resume_id", self.resume_id.into()),
            ("company", self.company.clone().into()),
            ("position", self.position.clone().into()),
            ("location", self.location.clone().into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("is_current", self.is_current.into()),
            ("description", self.description.clone().into()),
            ("highlights", self.highlights.clone().into()),
            ("sort_order", self.sort_order.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

impl ResumeChild for Experience {
    fn resume_id(&self) -> Uuid {
        self.resume_id
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Project
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub url: Option<String>,
    pub highlights: Vec<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn create(patch: ProjectPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut project = Project {
            id: Uuid::new_v4(),
            resume_id: required(patch.resume_id, "resumeId")?,
            name: required_text(patch.name.clone(), "name")?,
            description: None,
            technologies: Vec::new(),
            url: None,
            highlights: Vec::new(),
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        project.apply(patch, now)?;
        Ok(project)
    }

    pub fn apply(&mut self, patch: ProjectPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.resume_id, patch.resume_id);
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        merge(&mut self.description, patch.description);
        merge(&mut self.technologies, patch.technologies);
        merge(&mut self.url, patch.url);
        merge(&mut self.highlights, patch.highlights);
        merge(&mut self.sort_order, patch.sort_order);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub resume_id: Option<Uuid>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub technologies: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub url: Option<Option<String>>,
    pub highlights: Option<Vec<String>>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

impl Entity for Project {
    const TABLE: Table = Table::Projects;
    const ORDER: &'static [Order] = &[Order::asc(SORT_ORDER)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("resume_id", self.resume_id.into()),
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
            ("technologies", self.technologies.clone().into()),
            ("url", self.url.clone().into()),
            ("highlights", self.highlights.clone().into()),
            ("sort_order", self.sort_order.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

impl ResumeChild for Project {
    fn resume_id(&self) -> Uuid {
        self.resume_id
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skill category
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SkillCategory {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub name: String,
    pub skills: Vec<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillCategory {
    pub fn create(patch: SkillCategoryPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut category = SkillCategory {
            id: Uuid::new_v4(),
            resume_id: required(patch.resume_id, "resumeId")?,
            name: required_text(patch.name.clone(), "name")?,
            skills: Vec::new(),
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        category.apply(patch, now)?;
        Ok(category)
    }

    pub fn apply(&mut self, patch: SkillCategoryPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.resume_id, patch.resume_id);
        if let Some(name) = patch.name {
            self.name = non_blank(name, "name")?;
        }
        merge(&mut self.skills, patch.skills);
        merge(&mut self.sort_order, patch.sort_order);
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCategoryPatch {
    pub resume_id: Option<Uuid>,
    pub name: Option<String>,
    pub skills: Option<Vec<String>>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

impl Entity for SkillCategory {
    const TABLE: Table = Table::SkillCategories;
    const ORDER: &'static [Order] = &[Order::asc(SORT_ORDER)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("resume_id", self.resume_id.into()),
            ("name", self.name.clone().into()),
            ("skills", self.skills.clone().into()),
            ("sort_order", self.sort_order.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

impl ResumeChild for SkillCategory {
    fn resume_id(&self) -> Uuid {
        self.resume_id
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub gpa: Option<f64>,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Education {
    pub fn create(patch: EducationPatch, now: DateTime<Utc>) -> Result<Self, AppError> {
        let mut education = Education {
            id: Uuid::new_v4(),
            resume_id: required(patch.resume_id, "resumeId")?,
            institution: required_text(patch.institution.clone(), "institution")?,
            degree: required_text(patch.degree.clone(), "degree")?,
            field: None,
            start_date: None,
            end_date: None,
            gpa: None,
            description: None,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        };
        education.apply(patch, now)?;
        Ok(education)
    }

    pub fn apply(&mut self, patch: EducationPatch, now: DateTime<Utc>) -> Result<(), AppError> {
        merge(&mut self.resume_id, patch.resume_id);
        if let Some(institution) = patch.institution {
            self.institution = non_blank(institution, "institution")?;
        }
        if let Some(degree) = patch.degree {
            self.degree = non_blank(degree, "degree")?;
        }
        merge(&mut self.field, patch.field);
        merge(&mut self.start_date, patch.start_date);
        merge(&mut self.end_date, patch.end_date);
        merge(&mut self.gpa, patch.gpa);
        merge(&mut self.description, patch.description);
        merge(&mut self.sort_order, patch.sort_order);
        self.updated_at = now;

        if self.gpa.is_some_and(|gpa| gpa < 0.0) {
            return Err(AppError::Validation("gpa cannot be negative".to_string()));
        }
        check_date_range(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPatch {
    pub resume_id: Option<Uuid>,
    pub institution: Option<String>,
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub field: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable_date")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub gpa: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(rename = "order")]
    pub sort_order: Option<i32>,
}

impl Entity for Education {
    const TABLE: Table = Table::Educations;
    const ORDER: &'static [Order] = &[Order::asc(SORT_ORDER)];

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, SqlValue)> {
        vec![
            ("id", self.id.into()),
            ("resume_id", self.resume_id.into()),
            ("institution", self.institution.clone().into()),
            ("degree", self.degree.clone().into()),
            ("field", self.field.clone().into()),
            ("start_date", self.start_date.into()),
            ("end_date", self.end_date.into()),
            ("gpa", self.gpa.into()),
            ("description", self.description.clone().into()),
            ("sort_order", self.sort_order.into()),
            ("created_at", self.created_at.into()),
            ("updated_at", self.updated_at.into()),
        ]
    }
}

impl ResumeChild for Education {
    fn resume_id(&self) -> Uuid {
        self.resume_id
    }
}

fn check_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::Validation(
            "endDate cannot be before startDate".to_string(),
        )),
        _ => Ok(()),
    }
}
