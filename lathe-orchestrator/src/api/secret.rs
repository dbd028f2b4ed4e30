//! Secret API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
};
use lathe_core::dto::secret::CreateSecret;
use uuid::Uuid;

use super::auth::Credentials;
use super::error::ApiResult;
use super::{AppState, created};
use crate::service::secret::ScmAccessCheck;
use crate::service::secret_service;

/// POST /secrets
/// Store a secret; requires admin rights on the pipeline's repository
pub async fn create_secret(
    State(state): State<AppState>,
    credentials: Credentials,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<CreateSecret>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("Adding secret {} to pipeline {}", req.name, req.pipeline_id);

    let secret = secret_service::create_secret(
        &state.factories,
        state.scm.as_ref(),
        req,
        &credentials.username,
        uri.path(),
    )
    .await?;

    Ok(created(&state, &headers, secret))
}

/// DELETE /secrets/{id}
pub async fn delete_secret(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    credentials: Credentials,
) -> ApiResult<StatusCode> {
    tracing::info!("Removing secret: {}", id);

    let access = ScmAccessCheck::new(&state.factories, state.scm.as_ref());
    secret_service::remove_secret(&state.factories, &access, id, &credentials.username).await?;

    Ok(StatusCode::NO_CONTENT)
}
