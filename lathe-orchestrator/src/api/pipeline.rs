//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management, including the pipeline's jobs,
//! secrets and badge.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::IntoResponse,
};
use lathe_core::badge::Badge;
use lathe_core::domain::job::Job;
use lathe_core::domain::pipeline::Pipeline;
use lathe_core::dto::pipeline::{CreatePipeline, UpdatePipeline};
use lathe_core::dto::secret::SecretView;
use serde::Deserialize;
use uuid::Uuid;

use super::auth::Credentials;
use super::error::ApiResult;
use super::{AppState, ListParams, created};
use crate::service::pipeline::JobsParams;
use crate::service::{badge_service, pipeline_service, secret_service};

/// GET /pipelines
/// List pipelines
pub async fn list_pipelines(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Pipeline>>> {
    tracing::debug!("Listing pipelines: {:?}", params);

    let pipelines = pipeline_service::list_pipelines(&state.factories, params.options()?).await?;

    Ok(Json(pipelines))
}

/// POST /pipelines
/// Create a pipeline; the requester must be admin of the repository
pub async fn create_pipeline(
    State(state): State<AppState>,
    credentials: Credentials,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("Creating pipeline: {}", req.scm_url);

    let pipeline = pipeline_service::create_pipeline(
        &state.factories,
        state.scm.as_ref(),
        req,
        &credentials.username,
        uri.path(),
    )
    .await?;

    Ok(created(&state, &headers, pipeline))
}

/// GET /pipelines/{id}
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Pipeline>> {
    tracing::debug!("Getting pipeline: {}", id);

    let pipeline = pipeline_service::get_pipeline(&state.factories, id).await?;

    Ok(Json(pipeline))
}

/// PUT /pipelines/{id}
/// Point a pipeline at a new SCM URL
pub async fn update_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    credentials: Credentials,
    Json(req): Json<UpdatePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating pipeline {}: {}", id, req.scm_url);

    let pipeline = pipeline_service::update_pipeline(
        &state.factories,
        state.scm.as_ref(),
        id,
        req,
        &credentials.username,
        state.config.pipeline_update_capability,
    )
    .await?;

    Ok(Json(pipeline))
}

/// DELETE /pipelines/{id}
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    credentials: Credentials,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::remove_pipeline(&state.factories, state.scm.as_ref(), id, &credentials.username)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    page: Option<String>,
    count: Option<String>,
    archived: Option<String>,
}

/// GET /pipelines/{id}/jobs
///
/// Query parameters:
/// - archived: true | false (default false)
/// - page, count: pagination (defaults 1 and 50)
pub async fn list_pipeline_jobs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<JobsQuery>,
) -> ApiResult<Json<Vec<Job>>> {
    tracing::debug!("Listing jobs of pipeline {}: {:?}", id, query);

    let jobs = pipeline_service::list_pipeline_jobs(
        &state.factories,
        id,
        JobsParams {
            page: query.page.as_deref(),
            count: query.count.as_deref(),
            archived: query.archived.as_deref(),
        },
    )
    .await?;

    Ok(Json(jobs))
}

/// GET /pipelines/{id}/badge
/// Redirect to the badge image of the pipeline's latest build
///
/// Always redirects; an id that is not a pipeline id gets the unknown badge.
pub async fn badge(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let badge = match Uuid::parse_str(&id) {
        Ok(id) => badge_service::resolve_badge(&state.factories, id).await,
        Err(_) => Badge::unknown(),
    };
    let target = badge.render(&state.config.badge_template);

    tracing::debug!("Badge of pipeline {}: {}", id, target);

    (StatusCode::FOUND, [(header::LOCATION, target)])
}

/// GET /pipelines/{id}/secrets
/// Secrets of the pipeline without their values; requires push rights
pub async fn list_secrets(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    credentials: Credentials,
) -> ApiResult<Json<Vec<SecretView>>> {
    tracing::debug!("Listing secrets of pipeline {}", id);

    let secrets =
        secret_service::list_secrets(&state.factories, state.scm.as_ref(), id, &credentials.username)
            .await?;

    Ok(Json(secrets))
}
