//! Build API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, Uri},
    response::IntoResponse,
};
use lathe_core::domain::build::Build;
use lathe_core::dto::build::CreateBuild;
use uuid::Uuid;

use super::auth::Credentials;
use super::error::ApiResult;
use super::{AppState, created};
use crate::service::build::BuildRequest;
use crate::service::build_service;

/// POST /builds
/// Start a build of a job; requires push rights on the job's repository
pub async fn create_build(
    State(state): State<AppState>,
    credentials: Credentials,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<CreateBuild>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("Creating build of job {} for {}", req.job_id, credentials.username);

    let build = build_service::create_build(
        &state.factories,
        state.scm.as_ref(),
        BuildRequest {
            job_id: req.job_id,
            username: &credentials.username,
            api_uri: &state.config.api_uri,
            request_path: uri.path(),
        },
    )
    .await?;

    Ok(created(&state, &headers, build))
}

/// GET /builds/{id}
pub async fn get_build(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Build>> {
    tracing::debug!("Getting build: {}", id);

    let build = build_service::get_build(&state.factories, id).await?;

    Ok(Json(build))
}
