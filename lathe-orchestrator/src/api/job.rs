//! Job API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use lathe_core::domain::job::Job;

use super::error::ApiResult;
use super::{AppState, ListParams};
use crate::service::job_service;

/// GET /jobs
/// List jobs of every pipeline
///
/// Query parameters:
/// - page, count: pagination (defaults 1 and 50)
/// - sort: ascending | descending (default descending)
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Job>>> {
    tracing::debug!("Listing jobs: {:?}", params);

    let jobs = job_service::list_jobs(&state.factories, params.options()?).await?;

    Ok(Json(jobs))
}
