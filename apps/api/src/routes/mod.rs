pub mod applications;
pub mod companies;
pub mod contacts;
pub mod email_templates;
pub mod events;
pub mod health;
pub mod interviews;
pub mod learning;
pub mod reminders;
pub mod resources;
pub mod resume_templates;
pub mod resumes;
pub mod tasks;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::services::ServeDir;

use crate::models::resume::{Education, Experience, Project, SkillCategory};
use crate::services::resumes::ResumePart;
use crate::state::AppState;
use crate::uploads::PUBLIC_PREFIX;

/// Body returned by every successful delete.
pub fn deleted() -> Json<Value> {
    Json(json!({ "success": true }))
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health::health_handler))
        // Tracking
        .route(
            "/api/companies",
            get(companies::handle_list_companies).post(companies::handle_create_company),
        )
        .route(
            "/api/companies/:id",
            get(companies::handle_get_company)
                .patch(companies::handle_update_company)
                .delete(companies::handle_delete_company),
        )
        .route(
            "/api/contacts",
            get(contacts::handle_list_contacts).post(contacts::handle_create_contact),
        )
        .route(
            "/api/contacts/:id",
            get(contacts::handle_get_contact)
                .patch(contacts::handle_update_contact)
                .delete(contacts::handle_delete_contact),
        )
        .route(
            "/api/applications",
            get(applications::handle_list_applications)
                .post(applications::handle_create_application),
        )
        .route(
            "/api/applications/:id",
            get(applications::handle_get_application)
                .patch(applications::handle_update_application)
                .delete(applications::handle_delete_application),
        )
        .route(
            "/api/interviews",
            get(interviews::handle_list_interviews).post(interviews::handle_create_interview),
        )
        .route(
            "/api/interviews/:id",
            get(interviews::handle_get_interview)
                .patch(interviews::handle_update_interview)
                .delete(interviews::handle_delete_interview),
        )
        .route(
            "/api/reminders",
            get(reminders::handle_list_reminders).post(reminders::handle_create_reminder),
        )
        .route(
            "/api/reminders/:id",
            get(reminders::handle_get_reminder)
                .patch(reminders::handle_update_reminder)
                .delete(reminders::handle_delete_reminder),
        )
        .route(
            "/api/events",
            get(events::handle_list_events).post(events::handle_create_event),
        )
        .route(
            "/api/events/:id",
            get(events::handle_get_event)
                .patch(events::handle_update_event)
                .delete(events::handle_delete_event),
        )
        // Planning
        .route(
            "/api/tasks",
            get(tasks::handle_list_tasks).post(tasks::handle_create_task),
        )
        .route(
            "/api/tasks/:id",
            get(tasks::handle_get_task)
                .patch(tasks::handle_update_task)
                .delete(tasks::handle_delete_task),
        )
        .route(
            "/api/resources",
            get(resources::handle_list_resources).post(resources::handle_create_resource),
        )
        .route(
            "/api/resources/:id",
            get(resources::handle_get_resource)
                .patch(resources::handle_update_resource)
                .delete(resources::handle_delete_resource),
        )
        .route(
            "/api/learning",
            get(learning::handle_list_learning_items).post(learning::handle_create_learning_item),
        )
        .route(
            "/api/learning/:id",
            get(learning::handle_get_learning_item)
                .patch(learning::handle_update_learning_item)
                .delete(learning::handle_delete_learning_item),
        )
        .route(
            "/api/email-templates",
            get(email_templates::handle_list_email_templates)
                .post(email_templates::handle_create_email_template),
        )
        .route(
            "/api/email-templates/:id",
            get(email_templates::handle_get_email_template)
                .patch(email_templates::handle_update_email_template)
                .delete(email_templates::handle_delete_email_template),
        )
        // Resumes
        .route(
            "/api/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/api/resumes/:id",
            get(resumes::handle_get_resume)
                .patch(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .merge(resume_part_routes::<Experience>("experiences"))
        .merge(resume_part_routes::<Project>("projects"))
        .merge(resume_part_routes::<SkillCategory>("skills"))
        .merge(resume_part_routes::<Education>("education"))
        .route(
            "/api/resume-templates",
            get(resume_templates::handle_list_templates)
                .post(resume_templates::handle_create_template),
        )
        .route(
            "/api/resume-templates/:id",
            get(resume_templates::handle_get_template)
                .patch(resume_templates::handle_update_template)
                .delete(resume_templates::handle_delete_template),
        )
        .route(
            "/api/resume-sections",
            get(resume_templates::handle_list_sections)
                .post(resume_templates::handle_create_section),
        )
        .route(
            "/api/resume-sections/:id",
            get(resume_templates::handle_get_section)
                .patch(resume_templates::handle_update_section)
                .delete(resume_templates::handle_delete_section),
        );

    // An S3 bucket serves its own objects.
    let router = if state.config.s3.is_none() {
        router.nest_service(PUBLIC_PREFIX, ServeDir::new(&state.config.upload_dir))
    } else {
        router
    };

    router.with_state(state)
}

fn resume_part_routes<P: ResumePart>(path: &str) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/api/{path}"),
            get(resumes::handle_list_parts::<P>).post(resumes::handle_create_part::<P>),
        )
        .route(
            &format!("/api/{path}/:id"),
            get(resumes::handle_get_part::<P>)
                .patch(resumes::handle_update_part::<P>)
                .delete(resumes::handle_delete_part::<P>),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::store::Store;
    use crate::uploads::LocalStorage;

    const BOUNDARY: &str = "jobtrackerboundary";

    fn app(upload_dir: &std::path::Path) -> Router {
        let config = Config {
            database_url: None,
            upload_dir: upload_dir.to_string_lossy().into_owned(),
            s3: None,
            cors_allow_origin: None,
            port: 0,
            rust_log: "info".into(),
        };
        build_router(AppState {
            store: Store::in_memory(),
            files: Arc::new(LocalStorage::new(upload_dir)),
            config,
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn multipart_request(fields: &[(&str, &str)], file: (&str, &str, &str)) -> Request<Body> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        let (name, file_name, contents) = file;
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n--{BOUNDARY}--\r\n"
        ));
        Request::builder()
            .method(Method::POST)
            .uri("/api/applications")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn company(app: &Router, name: &str) -> Uuid {
        let (status, body) = send(
            app,
            json_request(Method::POST, "/api/companies", json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(&app(dir.path()), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "jobtracker");
    }

    #[tokio::test]
    async fn test_create_then_fetch_company() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let id = company(&app, "Acme").await;

        let (status, body) = send(&app, get_request(&format!("/api/companies/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Acme");
        assert_eq!(body["applications"], json!([]));
        assert_eq!(body["contacts"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_required_field_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            &app(dir.path()),
            json_request(Method::POST, "/api/companies", json!({ "website": "acme.io" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_date_is_400_and_row_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let company_id = company(&app, "Acme").await;
        let (status, created) = send(
            &app,
            json_request(
                Method::POST,
                "/api/applications",
                json!({
                    "companyId": company_id,
                    "positionTitle": "Backend Engineer",
                    "resumePath": "/uploads/resumes/1-cv.pdf",
                    "appliedDate": "2024-03-01"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["company"]["name"], "Acme");
        let uri = format!("/api/applications/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            json_request(Method::PATCH, &uri, json!({ "appliedDate": "last tuesday" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, after) = send(&app, get_request(&uri)).await;
        assert_eq!(after["appliedDate"], created["appliedDate"]);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let (status, body) = send(
            &app,
            get_request(&format!("/api/companies/{}", Uuid::new_v4())),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, get_request("/api/companies/not-a-uuid")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_reports_success_then_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let id = company(&app, "Acme").await;
        let uri = format!("/api/companies/{id}");

        let delete = || {
            Request::builder()
                .method(Method::DELETE)
                .uri(&uri)
                .body(Body::empty())
                .unwrap()
        };
        let (status, body) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (status, _) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_keys_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let id = company(&app, "Acme").await;
        let uri = format!("/api/companies/{id}");

        let (status, body) = send(
            &app,
            json_request(
                Method::PATCH,
                &uri,
                json!({ "name": "Acme Corp", "rating": 5, "id": Uuid::new_v4() }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Acme Corp");
        assert_eq!(body["id"], id.to_string());
        assert!(body.get("rating").is_none());
    }

    #[tokio::test]
    async fn test_resume_part_routes() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let (_, resume) = send(
            &app,
            json_request(Method::POST, "/api/resumes", json!({ "name": "Backend" })),
        )
        .await;
        let resume_id = resume["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            json_request(
                Method::POST,
                "/api/skills",
                json!({ "resumeId": resume_id, "name": "Languages", "skills": ["Rust"] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, skills) = send(
            &app,
            get_request(&format!("/api/skills?resumeId={resume_id}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(skills.as_array().unwrap().len(), 1);

        let (_, detail) = send(&app, get_request(&format!("/api/resumes/{resume_id}"))).await;
        assert_eq!(detail["skills"][0]["name"], "Languages");
    }

    #[tokio::test]
    async fn test_multipart_create_stores_resume_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let company_id = company(&app, "Acme").await.to_string();

        let (status, body) = send(
            &app,
            multipart_request(
                &[
                    ("companyId", company_id.as_str()),
                    ("positionTitle", "Backend Engineer"),
                    ("isReferred", "false"),
                    ("salaryMin", "90000"),
                    ("notes", ""),
                ],
                ("resume", "my cv.pdf", "%PDF-1.4"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["salaryMin"], 90000);
        assert_eq!(body["isReferred"], false);
        assert!(body["notes"].is_null());

        let reference = body["resumePath"].as_str().unwrap();
        assert!(reference.starts_with("/uploads/resumes/"));
        assert!(reference.ends_with("-my_cv.pdf"));

        let response = app.clone().oneshot(get_request(reference)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_rejected_multipart_row_writes_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let unknown_company = Uuid::new_v4().to_string();

        let (status, body) = send(
            &app,
            multipart_request(
                &[("companyId", unknown_company.as_str()), ("positionTitle", "SWE")],
                ("resume", "cv.pdf", "%PDF-1.4"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("companyId"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // A missing required field is rejected the same way.
        let company_id = company(&app, "Acme").await.to_string();
        let (status, _) = send(
            &app,
            multipart_request(
                &[("companyId", company_id.as_str())],
                ("resume", "cv.pdf", "%PDF-1.4"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_disallowed_upload_is_400_and_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let company_id = company(&app, "Acme").await.to_string();

        let (status, _) = send(
            &app,
            multipart_request(
                &[("companyId", company_id.as_str()), ("positionTitle", "Backend Engineer")],
                ("resume", "cv.exe", "MZ"),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let (_, list) = send(&app, get_request("/api/applications")).await;
        assert_eq!(list, json!([]));
    }
}
