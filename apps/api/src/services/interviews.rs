use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_exists};
use crate::errors::AppError;
use crate::filters::InterviewFilter;
use crate::models::application::Application;
use crate::models::interview::{Interview, InterviewPatch};
use crate::services::{fetch, load_by_ids};
use crate::store::{Store, Table};

#[derive(Debug, Serialize)]
pub struct InterviewView {
    #[serde(flatten)]
    pub interview: Interview,
    pub application: Option<Application>,
}

async fn views(store: &Store, interviews: Vec<Interview>) -> Result<Vec<InterviewView>, AppError> {
    let applications =
        load_by_ids::<Application>(store, interviews.iter().map(|i| Some(i.application_id)))
            .await?;
    Ok(interviews
        .into_iter()
        .map(|interview| InterviewView {
            application: applications.get(&interview.application_id).cloned(),
            interview,
        })
        .collect())
}

async fn view(store: &Store, interview: Interview) -> Result<InterviewView, AppError> {
    let application = store.get(interview.application_id).await?;
    Ok(InterviewView {
        interview,
        application,
    })
}

pub async fn list(store: &Store, filter: &InterviewFilter) -> Result<Vec<InterviewView>, AppError> {
    let interviews = store.list(&filter.query()).await?;
    views(store, interviews).await
}

pub async fn get(store: &Store, id: Uuid) -> Result<InterviewView, AppError> {
    let interview = fetch(store, id).await?;
    view(store, interview).await
}

pub async fn create(store: &Store, patch: InterviewPatch) -> Result<InterviewView, AppError> {
    let interview = Interview::create(patch, Utc::now())?;
    ensure_exists(store, Table::Applications, interview.application_id, "applicationId").await?;

    store.insert(&interview).await?;
    info!(
        "Created interview {} (round {}) for application {}",
        interview.id, interview.round, interview.application_id
    );
    view(store, interview).await
}

pub async fn update(store: &Store, id: Uuid, patch: InterviewPatch) -> Result<InterviewView, AppError> {
    if let Some(application_id) = patch.application_id {
        ensure_exists(store, Table::Applications, application_id, "applicationId").await?;
    }

    let mut interview: Interview = fetch(store, id).await?;
    interview.apply(patch, Utc::now())?;
    if !store.update(&interview).await? {
        return Err(AppError::not_found("interview", id));
    }
    view(store, interview).await
}

pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Interviews, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationPatch;
    use crate::models::company::CompanyPatch;
    use crate::services::{applications, companies};
    use chrono::Duration;

    async fn application(store: &Store) -> Uuid {
        let company = companies::create(
            store,
            CompanyPatch {
                name: Some("Initech".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        applications::create(
            store,
            ApplicationPatch {
                company_id: Some(company.id),
                position_title: Some("Backend".into()),
                resume_path: Some("/uploads/resumes/cv.pdf".into()),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap()
        .application
        .id
    }

    fn at(application_id: Uuid, title: &str, days: i64) -> InterviewPatch {
        InterviewPatch {
            application_id: Some(application_id),
            title: Some(title.into()),
            interview_date: Some(Utc::now() + Duration::days(days)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_by_application_in_date_order() {
        let store = Store::in_memory();
        let first = application(&store).await;
        let second = application(&store).await;
        create(&store, at(first, "Onsite", 7)).await.unwrap();
        create(&store, at(first, "Phone screen", 1)).await.unwrap();
        create(&store, at(second, "Other", 2)).await.unwrap();

        let filter = InterviewFilter {
            application_id: Some(first),
        };
        let titles: Vec<String> = list(&store, &filter)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.interview.title)
            .collect();
        assert_eq!(titles, vec!["Phone screen", "Onsite"]);
    }

    #[tokio::test]
    async fn test_defaults_and_round_validation() {
        let store = Store::in_memory();
        let app = application(&store).await;
        let created = create(&store, at(app, "Screen", 1)).await.unwrap();
        assert_eq!(created.interview.round, 1);
        assert!(created.application.is_some());

        let err = update(
            &store,
            created.interview.id,
            InterviewPatch {
                round: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_interviews_cascade_with_application() {
        let store = Store::in_memory();
        let app = application(&store).await;
        let created = create(&store, at(app, "Screen", 1)).await.unwrap();

        applications::delete(&store, app).await.unwrap();
        assert!(matches!(
            get(&store, created.interview.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
