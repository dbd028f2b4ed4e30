//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod auth;
pub mod build;
pub mod error;
pub mod health;
pub mod job;
pub mod pipeline;
pub mod secret;

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use lathe_core::dto::list::ListOptions;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::repository::Factories;
use crate::scm::ScmProvider;
use crate::service::{self, Created};

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub factories: Factories,
    pub scm: Arc<dyn ScmProvider>,
    pub config: Arc<Config>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and stats
        .route("/health", get(health::health_check))
        .route("/stats", get(health::stats))
        // Build endpoints
        .route("/builds", post(build::create_build))
        .route("/builds/{id}", get(build::get_build))
        // Job endpoints
        .route("/jobs", get(job::list_jobs))
        // Pipeline endpoints
        .route(
            "/pipelines",
            get(pipeline::list_pipelines).post(pipeline::create_pipeline),
        )
        .route(
            "/pipelines/{id}",
            get(pipeline::get_pipeline)
                .put(pipeline::update_pipeline)
                .delete(pipeline::delete_pipeline),
        )
        .route("/pipelines/{id}/jobs", get(pipeline::list_pipeline_jobs))
        .route("/pipelines/{id}/badge", get(pipeline::badge))
        .route("/pipelines/{id}/secrets", get(pipeline::list_secrets))
        // Secret endpoints
        .route("/secrets", post(secret::create_secret))
        .route("/secrets/{id}", delete(secret::delete_secret))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Raw `page`, `count` and `sort` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    count: Option<String>,
    sort: Option<String>,
}

impl ListParams {
    fn options(&self) -> service::Result<ListOptions> {
        service::parse_list_options(
            self.page.as_deref(),
            self.count.as_deref(),
            self.sort.as_deref(),
        )
    }
}

/// 201 response with the entity as body and a Location header
///
/// The location is absolute when the request named its host.
fn created<T: Serialize>(state: &AppState, headers: &HeaderMap, created: Created<T>) -> Response {
    let location = match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!(
            "{}://{}{}",
            state.config.public_protocol, host, created.location
        ),
        None => created.location,
    };

    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created.entity),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use crate::testing::{Fixture, SCM_URL, StubScm, TOKEN, USERNAME, admin, push, seeded};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use lathe_core::domain::permission::Permissions;
    use lathe_core::domain::user::{SealedToken, User};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const USER_HEADER: &str = "x-lathe-username";

    fn app(fixture: &Fixture, scm: StubScm) -> Router {
        create_router(AppState {
            factories: fixture.factories.clone(),
            scm: Arc::new(scm),
            config: Arc::new(Config::default()),
        })
    }

    fn get_as(uri: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(USER_HEADER, USERNAME)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let fixture = seeded().await;
        let response = app(&fixture, StubScm::default())
            .oneshot(get_as("/health", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_reports_scm_counters() {
        let fixture = seeded().await;
        let response = app(&fixture, StubScm::default())
            .oneshot(get_as("/stats", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["scm"]["requests"], 0);
    }

    #[tokio::test]
    async fn test_create_build_returns_location() {
        let fixture = seeded().await;
        let mut request = json_request("POST", "/builds", json!({ "jobId": fixture.job.id }));
        request
            .headers_mut()
            .insert(header::HOST, "api.lathe.test".parse().unwrap());

        let response = app(&fixture, StubScm::granting(SCM_URL, push()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
        let body = body_json(response).await;
        assert_eq!(
            location,
            format!("http://api.lathe.test/builds/{}", body["id"].as_str().unwrap())
        );
        assert_eq!(body["status"], "QUEUED");
        assert_eq!(body["number"], 1);
    }

    #[tokio::test]
    async fn test_create_build_without_credentials_is_unauthorized() {
        let fixture = seeded().await;
        let request = Request::builder()
            .method("POST")
            .uri("/builds")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "jobId": fixture.job.id }).to_string()))
            .unwrap();

        let response = app(&fixture, StubScm::granting(SCM_URL, push()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_build_without_push_is_unauthorized() {
        let fixture = seeded().await;
        let request = json_request("POST", "/builds", json!({ "jobId": fixture.job.id }));

        let response = app(&fixture, StubScm::default())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(fixture.store.build_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_pipeline_then_conflict() {
        let fixture = seeded().await;
        let scm_url = "git@github.com:org/Repo.git";
        let router = app(
            &fixture,
            StubScm::granting("git@github.com:org/repo.git#master", admin()),
        );

        let first = router
            .clone()
            .oneshot(json_request("POST", "/pipelines", json!({ "scmUrl": scm_url })))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let location = first.headers()[header::LOCATION].to_str().unwrap().to_string();
        let body = body_json(first).await;
        assert_eq!(body["scmUrl"], "git@github.com:org/repo.git#master");
        assert_eq!(body["admins"][USERNAME], true);
        assert_eq!(location, format!("/pipelines/{}", body["id"].as_str().unwrap()));

        let second = router
            .oneshot(json_request("POST", "/pipelines", json!({ "scmUrl": scm_url })))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_missing_pipeline_is_not_found() {
        let fixture = seeded().await;
        let uri = format!("/pipelines/{}", uuid::Uuid::new_v4());

        let response = app(&fixture, StubScm::default())
            .oneshot(get_as(&uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "error": "Pipeline does not exist" }));
    }

    #[tokio::test]
    async fn test_pipeline_jobs_bad_archived_flag() {
        let fixture = seeded().await;
        let uri = format!("/pipelines/{}/jobs?archived=blah", fixture.pipeline.id);

        let response = app(&fixture, StubScm::default())
            .oneshot(get_as(&uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pipeline_jobs() {
        let fixture = seeded().await;
        let uri = format!("/pipelines/{}/jobs?page=1&count=10", fixture.pipeline.id);

        let response = app(&fixture, StubScm::default())
            .oneshot(get_as(&uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body[0]["name"], "main");
    }

    #[tokio::test]
    async fn test_list_with_oversized_count_is_bad_request() {
        let fixture = seeded().await;

        let response = app(&fixture, StubScm::default())
            .oneshot(get_as("/pipelines?count=51", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_badge_redirects() {
        let fixture = seeded().await;
        let uri = format!("/pipelines/{}/badge", fixture.pipeline.id);

        let response = app(&fixture, StubScm::default())
            .oneshot(get_as(&uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "unknown/lightgrey");
    }

    #[tokio::test]
    async fn test_badge_for_non_uuid_id_redirects_to_unknown() {
        let fixture = seeded().await;

        let response = app(&fixture, StubScm::default())
            .oneshot(get_as("/pipelines/d398fb192747c9a0124e9e5b4e6e8e841cf8c71c/badge", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "unknown/lightgrey");
    }

    #[tokio::test]
    async fn test_pipeline_jobs_second_page_of_archived() {
        let fixture = seeded().await;
        for i in 0..35 {
            fixture
                .store
                .add_job(fixture.pipeline.id, &format!("PR-{i}"), true)
                .await;
        }
        let uri = format!(
            "/pipelines/{}/jobs?page=2&count=30&archived=true",
            fixture.pipeline.id
        );

        let response = app(&fixture, StubScm::default())
            .oneshot(get_as(&uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|job| job["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["PR-30", "PR-31", "PR-32", "PR-33", "PR-34"]);
    }

    #[tokio::test]
    async fn test_provisioned_user_on_fresh_store_can_create_pipeline() {
        let factories = Factories::in_memory(Arc::new(MemoryStore::new()));
        factories
            .provision_users(&[User::new("alice", SealedToken::new(TOKEN))])
            .await
            .unwrap();
        let router = create_router(AppState {
            factories,
            scm: Arc::new(StubScm::granting("git@github.com:org/repo.git#master", admin())),
            config: Arc::new(Config::default()),
        });

        let mut request = json_request(
            "POST",
            "/pipelines",
            json!({ "scmUrl": "git@github.com:org/repo.git" }),
        );
        request
            .headers_mut()
            .insert(USER_HEADER, "alice".parse().unwrap());

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["admins"]["alice"], true);
    }

    #[tokio::test]
    async fn test_secrets_without_push_are_forbidden() {
        let fixture = seeded().await;
        let uri = format!("/pipelines/{}/secrets", fixture.pipeline.id);
        let scm = StubScm::granting(
            SCM_URL,
            Permissions {
                pull: true,
                ..Permissions::none()
            },
        );

        let response = app(&fixture, scm)
            .oneshot(get_as(&uri, Some(USERNAME)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_secret_lifecycle() {
        let fixture = seeded().await;
        let router = app(&fixture, StubScm::granting(SCM_URL, admin()));

        let created = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/secrets",
                json!({
                    "pipelineId": fixture.pipeline.id,
                    "name": "NPM_TOKEN",
                    "value": "s3cr3t",
                    "allowInPR": false,
                }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body_json(created).await;
        assert!(created.get("value").is_none());

        let uri = format!("/pipelines/{}/secrets", fixture.pipeline.id);
        let listed = router
            .clone()
            .oneshot(get_as(&uri, Some(USERNAME)))
            .await
            .unwrap();
        assert_eq!(listed.status(), StatusCode::OK);
        assert_eq!(body_json(listed).await, json!([created.clone()]));

        let uri = format!("/secrets/{}", created["id"].as_str().unwrap());
        let removed = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(&uri)
                    .header(USER_HEADER, USERNAME)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    }
}
