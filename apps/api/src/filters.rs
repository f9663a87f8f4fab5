//! List filters: the recognised query-string parameters per endpoint and
//! their translation into store predicates.
//!
//! Unknown parameters are ignored by serde. A recognised parameter with an
//! unparseable value fails extraction and surfaces as a validation error.
//! Empty values (`?status=`) count as absent.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationStatus};
use crate::models::contact::Contact;
use crate::models::email_template::{EmailCategory, EmailTemplate};
use crate::models::event::{Event, EventStatus};
use crate::models::interview::Interview;
use crate::models::learning::{LearningItem, LearningStatus, LearningType};
use crate::models::reminder::Reminder;
use crate::models::resource::Resource;
use crate::models::resume::RESUME_ID;
use crate::models::resume_template::ResumeSection;
use crate::models::task::Task;
use crate::payload::parse_datetime;
use crate::store::Query;

/// Parses a query parameter through `FromStr`, treating an empty value as absent.
fn param<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// A calendar day, given either as `YYYY-MM-DD` or as any accepted timestamp
/// (reduced to its local date).
fn day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => {
            let raw = raw.trim();
            if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                return Ok(Some(date));
            }
            parse_datetime(raw)
                .map(|ts| Some(ts.with_timezone(&Local).date_naive()))
                .map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

/// First and last millisecond of `date` in server local time, as UTC.
pub fn local_day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = date.and_time(NaiveTime::MIN);
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .ok_or_else(|| AppError::Validation(format!("invalid date {date}")))?;
    Ok((to_utc(start)?, to_utc(end)?))
}

fn to_utc(naive: NaiveDateTime) -> Result<DateTime<Utc>, AppError> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .ok_or_else(|| AppError::Validation(format!("{naive} does not exist in local time")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFilter {
    #[serde(default, deserialize_with = "param")]
    pub company_id: Option<Uuid>,
    #[serde(default, deserialize_with = "param")]
    pub can_refer: Option<bool>,
}

impl ContactFilter {
    pub fn query(&self) -> Query {
        let mut query = Query::new();
        if let Some(company_id) = self.company_id {
            query = query.eq(Contact::COMPANY_ID, company_id);
        }
        // canRefer=false means "don't filter", not "only non-referrers".
        if self.can_refer == Some(true) {
            query = query.eq(Contact::CAN_REFER, true);
        }
        query
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationFilter {
    #[serde(default, deserialize_with = "param")]
    pub status: Option<ApplicationStatus>,
    #[serde(default, deserialize_with = "param")]
    pub company_id: Option<Uuid>,
}

impl ApplicationFilter {
    pub fn query(&self) -> Query {
        let mut query = Query::new();
        if let Some(status) = self.status {
            query = query.eq(Application::STATUS, status);
        }
        if let Some(company_id) = self.company_id {
            query = query.eq(Application::COMPANY_ID, company_id);
        }
        query
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewFilter {
    #[serde(default, deserialize_with = "param")]
    pub application_id: Option<Uuid>,
}

impl InterviewFilter {
    pub fn query(&self) -> Query {
        match self.application_id {
            Some(id) => Query::new().eq(Interview::APPLICATION_ID, id),
            None => Query::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderFilter {
    #[serde(default, deserialize_with = "param")]
    pub is_completed: Option<bool>,
    #[serde(default, deserialize_with = "param")]
    pub application_id: Option<Uuid>,
}

impl ReminderFilter {
    pub fn query(&self) -> Query {
        let mut query = Query::new();
        if let Some(done) = self.is_completed {
            query = query.eq(Reminder::IS_COMPLETED, done);
        }
        if let Some(id) = self.application_id {
            query = query.eq(Reminder::APPLICATION_ID, id);
        }
        query
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskFilter {
    #[serde(default, deserialize_with = "day")]
    pub date: Option<NaiveDate>,
}

impl TaskFilter {
    /// Top-level tasks only; subtasks are reached through their parent.
    pub fn query(&self) -> Result<Query, AppError> {
        let mut query = Query::new().is_null(Task::PARENT_TASK_ID);
        if let Some(date) = self.date {
            let (from, to) = local_day_bounds(date)?;
            query = query.between(Task::DUE_DATE, from, to);
        }
        Ok(query)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    #[serde(default, deserialize_with = "param")]
    pub application_id: Option<Uuid>,
    #[serde(default, deserialize_with = "param")]
    pub contact_id: Option<Uuid>,
    #[serde(default, deserialize_with = "param")]
    pub status: Option<EventStatus>,
}

impl EventFilter {
    pub fn query(&self) -> Query {
        let mut query = Query::new();
        if let Some(id) = self.application_id {
            query = query.eq(Event::APPLICATION_ID, id);
        }
        if let Some(id) = self.contact_id {
            query = query.eq(Event::CONTACT_ID, id);
        }
        if let Some(status) = self.status {
            query = query.eq(Event::STATUS, status);
        }
        query
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceFilter {
    #[serde(default, deserialize_with = "param")]
    pub parent_id: Option<Uuid>,
    #[serde(default, deserialize_with = "param")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "param")]
    pub is_favorite: Option<bool>,
}

impl ResourceFilter {
    /// Without `parentId`, only top-level resources are listed.
    pub fn query(&self) -> Query {
        let mut query = match self.parent_id {
            Some(parent) => Query::new().eq(Resource::PARENT_ID, parent),
            None => Query::new().is_null(Resource::PARENT_ID),
        };
        if let Some(category) = &self.category {
            query = query.eq(Resource::CATEGORY, category.clone());
        }
        if let Some(favorite) = self.is_favorite {
            query = query.eq(Resource::IS_FAVORITE, favorite);
        }
        query
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LearningFilter {
    #[serde(default, deserialize_with = "param")]
    pub status: Option<LearningStatus>,
    #[serde(default, rename = "type", deserialize_with = "param")]
    pub kind: Option<LearningType>,
}

impl LearningFilter {
    pub fn query(&self) -> Query {
        let mut query = Query::new();
        if let Some(status) = self.status {
            query = query.eq(LearningItem::STATUS, status);
        }
        if let Some(kind) = self.kind {
            query = query.eq(LearningItem::KIND, kind);
        }
        query
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EmailTemplateFilter {
    #[serde(default, deserialize_with = "param")]
    pub category: Option<EmailCategory>,
}

impl EmailTemplateFilter {
    pub fn query(&self) -> Query {
        match self.category {
            Some(category) => Query::new().eq(EmailTemplate::CATEGORY, category),
            None => Query::new(),
        }
    }
}

/// Shared by experiences, projects, skills and education.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeChildFilter {
    #[serde(default, deserialize_with = "param")]
    pub resume_id: Option<Uuid>,
}

impl ResumeChildFilter {
    pub fn query(&self) -> Query {
        match self.resume_id {
            Some(id) => Query::new().eq(RESUME_ID, id),
            None => Query::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFilter {
    #[serde(default, deserialize_with = "param")]
    pub template_id: Option<Uuid>,
}

impl SectionFilter {
    pub fn query(&self) -> Query {
        match self.template_id {
            Some(id) => Query::new().eq(ResumeSection::TEMPLATE_ID, id),
            None => Query::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Predicate, SqlValue};
    use chrono::Timelike;

    fn from_qs<T: serde::de::DeserializeOwned>(qs: &str) -> Result<T, String> {
        axum::extract::Query::<T>::try_from_uri(&format!("/x?{qs}").parse().unwrap())
            .map(|q| q.0)
            .map_err(|e| e.body_text())
    }

    #[test]
    fn test_unknown_params_are_ignored() {
        let filter: ApplicationFilter = from_qs("sort=name&page=2").unwrap();
        assert!(filter.query().predicates.is_empty());
    }

    #[test]
    fn test_bad_enum_value_is_rejected() {
        assert!(from_qs::<ApplicationFilter>("status=SHORTLISTED").is_err());
        assert!(from_qs::<ApplicationFilter>("companyId=not-a-uuid").is_err());
    }

    #[test]
    fn test_empty_value_counts_as_absent() {
        let filter: ApplicationFilter = from_qs("status=&companyId=").unwrap();
        assert!(filter.status.is_none());
        assert!(filter.company_id.is_none());
    }

    #[test]
    fn test_can_refer_false_does_not_filter() {
        let filter: ContactFilter = from_qs("canRefer=false").unwrap();
        assert!(filter.query().predicates.is_empty());

        let filter: ContactFilter = from_qs("canRefer=true").unwrap();
        assert_eq!(
            filter.query().predicates,
            vec![Predicate::Eq(Contact::CAN_REFER, SqlValue::Bool(true))]
        );
    }

    #[test]
    fn test_tasks_are_top_level_and_day_bounded() {
        let filter: TaskFilter = from_qs("date=2024-03-01").unwrap();
        let query = filter.query().unwrap();
        assert_eq!(query.predicates[0], Predicate::IsNull(Task::PARENT_TASK_ID));
        match &query.predicates[1] {
            Predicate::Between(field, from, to) => {
                assert_eq!(*field, Task::DUE_DATE);
                let local_from = from.with_timezone(&Local);
                let local_to = to.with_timezone(&Local);
                assert_eq!(local_from.hour(), 0);
                assert_eq!((local_to.hour(), local_to.minute()), (23, 59));
                assert_eq!(local_to.timestamp_subsec_millis(), 999);
            }
            other => panic!("expected a range, got {other:?}"),
        }
    }

    #[test]
    fn test_resources_default_to_top_level() {
        let filter: ResourceFilter = from_qs("").unwrap();
        assert_eq!(
            filter.query().predicates,
            vec![Predicate::IsNull(Resource::PARENT_ID)]
        );
    }

    #[test]
    fn test_learning_filters_on_type_key() {
        let filter: LearningFilter = from_qs("type=BOOK&status=IN_PROGRESS").unwrap();
        assert_eq!(filter.query().predicates.len(), 2);
    }
}
