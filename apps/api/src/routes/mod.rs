pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::jobs::handlers as jobs;
use crate::profile::handlers as profile;
use crate::resume::handlers as resume;
use crate::state::AppState;

/// Multipart framing and text fields on top of the PDF itself.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + UPLOAD_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_put_profile),
        )
        .route(
            "/api/v1/profile/manual-entry",
            post(profile::handle_manual_entry),
        )
        .route(
            "/api/v1/profile/skills",
            get(profile::handle_list_skills).post(profile::handle_add_skill),
        )
        .route(
            "/api/v1/profile/skills/:id",
            delete(profile::handle_delete_skill),
        )
        .route(
            "/api/v1/profile/projects",
            get(profile::handle_list_projects).post(profile::handle_create_project),
        )
        .route(
            "/api/v1/profile/projects/:id",
            put(profile::handle_update_project).delete(profile::handle_delete_project),
        )
        .route(
            "/api/v1/profile/experiences",
            get(profile::handle_list_experiences).post(profile::handle_create_experience),
        )
        .route(
            "/api/v1/profile/experiences/:id",
            put(profile::handle_update_experience).delete(profile::handle_delete_experience),
        )
        .route(
            "/api/v1/profile/education",
            get(profile::handle_list_education).post(profile::handle_create_education),
        )
        .route(
            "/api/v1/profile/education/:id",
            put(profile::handle_update_education).delete(profile::handle_delete_education),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/upload",
            post(jobs::handle_upload_job).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/match", post(jobs::handle_rematch_job))
        .route(
            "/api/v1/jobs/:id/matches",
            get(jobs::handle_get_job_matches),
        )
        // Resumes
        .route(
            "/api/v1/resumes/:job_id",
            get(resume::handle_get_resume).put(resume::handle_save_resume),
        )
        .route(
            "/api/v1/resumes/:job_id/export",
            get(resume::handle_export_resume),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use aws_sdk_s3::config::{BehaviorVersion, Region};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::PROFILE_HEADER;
    use crate::config::Config;
    use crate::errors::AppError;
    use crate::matching::{MatchResolver, MatchResult};
    use crate::models::profile::ProfileInventory;
    use crate::store::{MemoryStore, ProfileRepository, Store};

    /// Matches every skill named "Go" and nothing else.
    struct GoOnlyResolver;

    #[async_trait]
    impl MatchResolver for GoOnlyResolver {
        async fn resolve(
            &self,
            inventory: &ProfileInventory,
            _job_description: &str,
        ) -> Result<MatchResult, AppError> {
            Ok(MatchResult {
                matched_skill_ids: inventory
                    .skills
                    .iter()
                    .filter(|s| s.name == "Go")
                    .map(|s| s.id)
                    .collect(),
                ..Default::default()
            })
        }
    }

    fn app(store: Arc<MemoryStore>) -> Router {
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        let store: Arc<dyn Store> = store;
        build_router(AppState {
            store,
            resolver: Arc::new(GoOnlyResolver),
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            config: Config::for_tests(),
        })
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(PROFILE_HEADER, "user_1");
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health_needs_no_profile() {
        let app = app(Arc::new(MemoryStore::new()));
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "tailor-api");
    }

    #[tokio::test]
    async fn test_missing_profile_header_is_unauthorized() {
        let app = app(Arc::new(MemoryStore::new()));
        let req = Request::builder()
            .uri("/api/v1/jobs")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_job_to_resume_flow() {
        let store = Arc::new(MemoryStore::new());
        store.add_skill("user_1", "Go").await.unwrap();
        store.add_skill("user_1", "SQL").await.unwrap();
        let app = app(store.clone());

        let (status, created) = send(
            &app,
            request(
                "POST",
                "/api/v1/jobs",
                Some(json!({
                    "title": "Go Developer",
                    "company": "Initech",
                    "description": "needs Go experience"
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let job_id = created["id"].as_i64().unwrap();
        let resume_uri = format!("/api/v1/resumes/{job_id}");

        let (status, view) = send(&app, request("GET", &resume_uri, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["source"], "matched");
        assert_eq!(view["skills"].as_array().unwrap().len(), 1);
        assert_eq!(view["skills"][0]["name"], "Go");
        assert_eq!(view["personal"]["title"], "Go Developer");

        let (status, _) = send(
            &app,
            request(
                "PUT",
                &resume_uri,
                Some(json!({
                    "personal": { "name": "Ada" },
                    "skills": [{ "id": 1, "name": "Go" }, { "id": 2, "name": "SQL" }]
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, view) = send(&app, request("GET", &resume_uri, None)).await;
        assert_eq!(view["source"], "snapshot");
        assert_eq!(view["skills"].as_array().unwrap().len(), 2);
        assert_eq!(view["personal"]["company"], "Initech");

        let response = app
            .clone()
            .oneshot(request("GET", &format!("{resume_uri}/export"), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/markdown; charset=utf-8"
        );

        let job_uri = format!("/api/v1/jobs/{job_id}");
        let (status, _) = send(&app, request("DELETE", &job_uri, None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(store.snapshot_count(), 0);
        assert_eq!(store.match_row_count(), 0);
    }

    #[tokio::test]
    async fn test_other_profiles_job_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store);

        let (_, created) = send(
            &app,
            request(
                "POST",
                "/api/v1/jobs",
                Some(json!({ "title": "SRE", "company": "Globex" })),
            ),
        )
        .await;
        let job_id = created["id"].as_i64().unwrap();
        assert!(created["matches"].is_null());

        let req = Request::builder()
            .uri(format!("/api/v1/resumes/{job_id}"))
            .header(PROFILE_HEADER, "someone_else")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_blank_job_title_is_bad_request() {
        let app = app(Arc::new(MemoryStore::new()));
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/v1/jobs",
                Some(json!({ "title": " ", "company": "Globex" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "title is required");
    }
}
