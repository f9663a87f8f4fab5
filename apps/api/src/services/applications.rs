use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_exists, ensure_optional};
use crate::derivation;
use crate::errors::AppError;
use crate::filters::ApplicationFilter;
use crate::models::application::{Application, ApplicationPatch};
use crate::models::company::Company;
use crate::models::contact::Contact;
use crate::models::interview::Interview;
use crate::models::reminder::Reminder;
use crate::services::{fetch, load_by_ids};
use crate::store::{Query, Store, Table};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub company: Option<Company>,
    pub referred_by: Option<Contact>,
    /// Only on a single-application read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interviews: Option<Vec<Interview>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<Reminder>>,
}

async fn views(store: &Store, applications: Vec<Application>) -> Result<Vec<ApplicationView>, AppError> {
    let companies =
        load_by_ids::<Company>(store, applications.iter().map(|a| Some(a.company_id))).await?;
    let referrers =
        load_by_ids::<Contact>(store, applications.iter().map(|a| a.referred_by_id)).await?;

    Ok(applications
        .into_iter()
        .map(|application| ApplicationView {
            company: companies.get(&application.company_id).cloned(),
            referred_by: application
                .referred_by_id
                .and_then(|id| referrers.get(&id).cloned()),
            application,
            interviews: None,
            reminders: None,
        })
        .collect())
}

async fn view(store: &Store, application: Application) -> Result<ApplicationView, AppError> {
    views(store, vec![application])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("application view went missing")))
}

pub async fn list(store: &Store, filter: &ApplicationFilter) -> Result<Vec<ApplicationView>, AppError> {
    let applications = store.list(&filter.query()).await?;
    views(store, applications).await
}

pub async fn get(store: &Store, id: Uuid) -> Result<ApplicationView, AppError> {
    let application = fetch(store, id).await?;
    let mut view = view(store, application).await?;
    view.interviews = Some(
        store
            .list(&Query::new().eq(Interview::APPLICATION_ID, id))
            .await?,
    );
    view.reminders = Some(
        store
            .list(&Query::new().eq(Reminder::APPLICATION_ID, id))
            .await?,
    );
    Ok(view)
}

/// Builds a new application and checks its references without writing it.
pub async fn prepare(
    store: &Store,
    patch: ApplicationPatch,
    now: DateTime<Utc>,
) -> Result<Application, AppError> {
    let application = Application::create(derivation::application(patch, now), now)?;
    ensure_exists(store, Table::Companies, application.company_id, "companyId").await?;
    ensure_optional(store, Table::Contacts, application.referred_by_id, "referredById").await?;
    Ok(application)
}

/// Persists an application returned by [`prepare`].
pub async fn insert(store: &Store, application: Application) -> Result<ApplicationView, AppError> {
    store.insert(&application).await?;
    info!(
        "Created application {} for '{}' ({})",
        application.id, application.position_title, application.status
    );
    view(store, application).await
}

/// `now` is taken by the caller so uploads and the row share one timestamp.
pub async fn create(
    store: &Store,
    patch: ApplicationPatch,
    now: DateTime<Utc>,
) -> Result<ApplicationView, AppError> {
    let application = prepare(store, patch, now).await?;
    insert(store, application).await
}

pub async fn update(
    store: &Store,
    id: Uuid,
    patch: ApplicationPatch,
) -> Result<ApplicationView, AppError> {
    let now = Utc::now();
    let patch = derivation::application(patch, now);
    if let Some(company_id) = patch.company_id {
        ensure_exists(store, Table::Companies, company_id, "companyId").await?;
    }
    if let Some(referred_by_id) = patch.referred_by_id {
        ensure_optional(store, Table::Contacts, referred_by_id, "referredById").await?;
    }

    let mut application: Application = fetch(store, id).await?;
    application.apply(patch, now)?;
    if !store.update(&application).await? {
        return Err(AppError::not_found("application", id));
    }
    view(store, application).await
}

/// Interviews, reminders and events go with the application.
pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Applications, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus;
    use crate::models::contact::ContactPatch;
    use crate::services::{companies, contacts};
    use crate::models::company::CompanyPatch;
    use chrono::Duration;

    async fn acme(store: &Store) -> Company {
        companies::create(
            store,
            CompanyPatch {
                name: Some("Acme".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn swe(company_id: Uuid) -> ApplicationPatch {
        ApplicationPatch {
            company_id: Some(company_id),
            position_title: Some("SWE".into()),
            resume_path: Some("/uploads/resumes/r.pdf".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applied_then_fetch_has_applied_date() {
        let store = Store::in_memory();
        let company = acme(&store).await;
        let before = Utc::now();

        let created = create(
            &store,
            ApplicationPatch {
                status: Some(ApplicationStatus::Applied),
                ..swe(company.id)
            },
            Utc::now(),
        )
        .await
        .unwrap();

        let fetched = get(&store, created.application.id).await.unwrap();
        let applied = fetched.application.applied_date.expect("appliedDate set");
        assert!(applied >= before && applied <= Utc::now());
        assert_eq!(fetched.company.unwrap().name, "Acme");
        assert_eq!(fetched.interviews.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_update_to_applied_respects_explicit_date() {
        let store = Store::in_memory();
        let company = acme(&store).await;
        let created = create(&store, swe(company.id), Utc::now()).await.unwrap();
        assert!(created.application.applied_date.is_none());

        let chosen = Utc::now() - Duration::days(10);
        let updated = update(
            &store,
            created.application.id,
            ApplicationPatch {
                status: Some(ApplicationStatus::Applied),
                applied_date: Some(Some(chosen)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.application.applied_date, Some(chosen));

        let before = Utc::now();
        let again = update(
            &store,
            created.application.id,
            ApplicationPatch {
                status: Some(ApplicationStatus::Applied),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(again.application.applied_date.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_missing_required_fields_persist_nothing() {
        let store = Store::in_memory();
        let company = acme(&store).await;

        for patch in [
            ApplicationPatch {
                position_title: None,
                ..swe(company.id)
            },
            ApplicationPatch {
                company_id: None,
                ..swe(company.id)
            },
            ApplicationPatch {
                resume_path: None,
                ..swe(company.id)
            },
        ] {
            let err = create(&store, patch, Utc::now()).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(list(&store, &ApplicationFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dangling_company_or_referrer_is_validation_error() {
        let store = Store::in_memory();
        let err = create(&store, swe(Uuid::new_v4()), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let company = acme(&store).await;
        let err = create(
            &store,
            ApplicationPatch {
                referred_by_id: Some(Some(Uuid::new_v4())),
                ..swe(company.id)
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("referredById")));
    }

    #[tokio::test]
    async fn test_deleting_referrer_nullifies_and_keeps_is_referred() {
        let store = Store::in_memory();
        let company = acme(&store).await;
        let referrer = contacts::create(
            &store,
            ContactPatch {
                company_id: Some(company.id),
                name: Some("Ada".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let created = create(
            &store,
            ApplicationPatch {
                is_referred: Some(true),
                referred_by_id: Some(Some(referrer.contact.id)),
                ..swe(company.id)
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert_eq!(created.referred_by.unwrap().name, "Ada");

        contacts::delete(&store, referrer.contact.id).await.unwrap();

        let fetched = get(&store, created.application.id).await.unwrap();
        assert_eq!(fetched.application.referred_by_id, None);
        assert!(fetched.application.is_referred);
        assert!(fetched.referred_by.is_none());
    }

    #[tokio::test]
    async fn test_deleting_company_cascades() {
        let store = Store::in_memory();
        let company = acme(&store).await;
        let application = create(&store, swe(company.id), Utc::now()).await.unwrap();
        let contact = contacts::create(
            &store,
            ContactPatch {
                company_id: Some(company.id),
                name: Some("Grace".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        companies::delete(&store, company.id).await.unwrap();

        assert!(matches!(
            get(&store, application.application.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            contacts::get(&store, contact.contact.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_salary_range_checked_on_update() {
        let store = Store::in_memory();
        let company = acme(&store).await;
        let created = create(
            &store,
            ApplicationPatch {
                salary_min: Some(Some(100)),
                ..swe(company.id)
            },
            Utc::now(),
        )
        .await
        .unwrap();

        let err = update(
            &store,
            created.application.id,
            ApplicationPatch {
                salary_max: Some(Some(50)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let unchanged = get(&store, created.application.id).await.unwrap();
        assert_eq!(unchanged.application.salary_max, None);
    }
}
