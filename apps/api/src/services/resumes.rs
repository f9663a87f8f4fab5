//! Resumes and their ordered parts. The four part types share one set of
//! operations through [`ResumePart`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::consistency::{self, ensure_exists};
use crate::errors::AppError;
use crate::filters::ResumeChildFilter;
use crate::models::resume::{
    Education, EducationPatch, Experience, ExperiencePatch, Project, ProjectPatch, Resume,
    ResumeChild, ResumePatch, SkillCategory, SkillCategoryPatch, RESUME_ID,
};
use crate::services::fetch;
use crate::store::{Query, Store, Table};

/// A single resume with all of its parts, each in display order.
#[derive(Debug, Serialize)]
pub struct ResumeDetail {
    #[serde(flatten)]
    pub resume: Resume,
    pub experiences: Vec<Experience>,
    pub projects: Vec<Project>,
    pub skills: Vec<SkillCategory>,
    pub education: Vec<Education>,
}

pub async fn list(store: &Store) -> Result<Vec<Resume>, AppError> {
    Ok(store.list(&Query::new()).await?)
}

pub async fn get(store: &Store, id: Uuid) -> Result<ResumeDetail, AppError> {
    let resume: Resume = fetch(store, id).await?;
    let parts = Query::new().eq(RESUME_ID, id);
    Ok(ResumeDetail {
        resume,
        experiences: store.list(&parts).await?,
        projects: store.list(&parts).await?,
        skills: store.list(&parts).await?,
        education: store.list(&parts).await?,
    })
}

pub async fn create(store: &Store, patch: ResumePatch) -> Result<Resume, AppError> {
    let resume = Resume::create(patch, Utc::now())?;
    store.insert(&resume).await?;
    info!("Created resume {} ({})", resume.id, resume.name);
    Ok(resume)
}

pub async fn update(store: &Store, id: Uuid, patch: ResumePatch) -> Result<Resume, AppError> {
    let mut resume: Resume = fetch(store, id).await?;
    resume.apply(patch, Utc::now())?;
    if !store.update(&resume).await? {
        return Err(AppError::not_found("resume", id));
    }
    Ok(resume)
}

/// Every part goes with the resume.
pub async fn delete(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, Table::Resumes, id).await
}

// ────────────────────────────────────────────────────────────────────────────
// Parts: experiences, projects, skill categories, education
// ────────────────────────────────────────────────────────────────────────────

pub trait ResumePart: ResumeChild {
    type Patch: DeserializeOwned + Send + 'static;

    fn create(patch: Self::Patch, now: DateTime<Utc>) -> Result<Self, AppError>;
    fn apply(&mut self, patch: Self::Patch, now: DateTime<Utc>) -> Result<(), AppError>;
    fn patch_resume_id(patch: &Self::Patch) -> Option<Uuid>;
}

macro_rules! resume_part {
    ($row:ty, $patch:ty) => {
        impl ResumePart for $row {
            type Patch = $patch;

            fn create(patch: $patch, now: DateTime<Utc>) -> Result<Self, AppError> {
                <$row>::create(patch, now)
            }

            fn apply(&mut self, patch: $patch, now: DateTime<Utc>) -> Result<(), AppError> {
                <$row>::apply(self, patch, now)
            }

            fn patch_resume_id(patch: &$patch) -> Option<Uuid> {
                patch.resume_id
            }
        }
    };
}

resume_part!(Experience, ExperiencePatch);
resume_part!(Project, ProjectPatch);
resume_part!(SkillCategory, SkillCategoryPatch);
resume_part!(Education, EducationPatch);

pub async fn list_parts<P: ResumePart>(
    store: &Store,
    filter: &ResumeChildFilter,
) -> Result<Vec<P>, AppError> {
    Ok(store.list(&filter.query()).await?)
}

pub async fn get_part<P: ResumePart>(store: &Store, id: Uuid) -> Result<P, AppError> {
    fetch(store, id).await
}

pub async fn create_part<P: ResumePart>(store: &Store, patch: P::Patch) -> Result<P, AppError> {
    let part = <P as ResumePart>::create(patch, Utc::now())?;
    ensure_exists(store, Table::Resumes, part.resume_id(), "resumeId").await?;

    store.insert(&part).await?;
    info!(
        "Created {} {} on resume {}",
        P::TABLE.label(),
        part.id(),
        part.resume_id()
    );
    Ok(part)
}

pub async fn update_part<P: ResumePart>(
    store: &Store,
    id: Uuid,
    patch: P::Patch,
) -> Result<P, AppError> {
    if let Some(resume_id) = P::patch_resume_id(&patch) {
        ensure_exists(store, Table::Resumes, resume_id, "resumeId").await?;
    }

    let mut part: P = fetch(store, id).await?;
    ResumePart::apply(&mut part, patch, Utc::now())?;
    if !store.update(&part).await? {
        return Err(AppError::not_found(P::TABLE.label(), id));
    }
    Ok(part)
}

pub async fn delete_part<P: ResumePart>(store: &Store, id: Uuid) -> Result<(), AppError> {
    consistency::delete(store, P::TABLE, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn resume(store: &Store) -> Resume {
        create(
            store,
            ResumePatch {
                name: Some("Backend 2024".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn skills(resume_id: Uuid, name: &str, order: i32) -> SkillCategoryPatch {
        SkillCategoryPatch {
            resume_id: Some(resume_id),
            name: Some(name.into()),
            skills: Some(vec!["Rust".into(), "SQL".into()]),
            sort_order: Some(order),
        }
    }

    #[tokio::test]
    async fn test_detail_lists_parts_in_display_order() {
        let store = Store::in_memory();
        let resume = resume(&store).await;
        create_part::<SkillCategory>(&store, skills(resume.id, "Tools", 2)).await.unwrap();
        create_part::<SkillCategory>(&store, skills(resume.id, "Languages", 1)).await.unwrap();
        create_part::<SkillCategory>(&store, skills(resume.id, "Also first", 1)).await.unwrap();
        create_part::<Project>(
            &store,
            ProjectPatch {
                resume_id: Some(resume.id),
                name: Some("jobtracker".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let detail = get(&store, resume.id).await.unwrap();
        let names: Vec<&str> = detail.skills.iter().map(|s| s.name.as_str()).collect();
        // Equal `order` values keep creation order.
        assert_eq!(names, vec!["Languages", "Also first", "Tools"]);
        assert_eq!(detail.projects.len(), 1);
        assert!(detail.experiences.is_empty());
    }

    #[tokio::test]
    async fn test_part_requires_existing_resume() {
        let store = Store::in_memory();
        let err = create_part::<Education>(
            &store,
            EducationPatch {
                resume_id: Some(Uuid::new_v4()),
                institution: Some("ETH".into()),
                degree: Some("MSc".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("resumeId")));
    }

    #[tokio::test]
    async fn test_deleting_resume_removes_parts() {
        let store = Store::in_memory();
        let resume = resume(&store).await;
        let experience = create_part::<Experience>(
            &store,
            ExperiencePatch {
                resume_id: Some(resume.id),
                company: Some("Acme".into()),
                position: Some("Engineer".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete(&store, resume.id).await.unwrap();
        assert!(matches!(
            get_part::<Experience>(&store, experience.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_filter_parts_by_resume() {
        let store = Store::in_memory();
        let mine = resume(&store).await;
        let other = resume(&store).await;
        create_part::<SkillCategory>(&store, skills(mine.id, "A", 0)).await.unwrap();
        create_part::<SkillCategory>(&store, skills(other.id, "B", 0)).await.unwrap();

        let filter = ResumeChildFilter {
            resume_id: Some(mine.id),
        };
        let parts: Vec<SkillCategory> = list_parts(&store, &filter).await.unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "A");
    }
}
