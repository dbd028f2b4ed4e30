//! Pipeline Service
//!
//! Business logic for pipeline management. Pipelines are keyed by their
//! normalized SCM URL; creating one requires admin rights on the repository.

use lathe_core::domain::job::Job;
use lathe_core::domain::permission::Capability;
use lathe_core::domain::pipeline::Pipeline;
use lathe_core::dto::list::{JobQuery, ListOptions};
use lathe_core::dto::pipeline::{CreatePipeline, NewPipeline, PipelinePatch, UpdatePipeline};
use lathe_core::scm_url;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::auth::{AuthorizationGate, Denial};
use super::{Created, Error, Result, parse_flag, parse_paginate};
use crate::repository::Factories;
use crate::scm::ScmProvider;

/// Get a pipeline by ID
pub async fn get_pipeline(factories: &Factories, id: Uuid) -> Result<Pipeline> {
    factories
        .pipelines
        .get(id)
        .await?
        .ok_or_else(pipeline_not_found)
}

/// List pipelines
pub async fn list_pipelines(factories: &Factories, options: ListOptions) -> Result<Vec<Pipeline>> {
    let pipelines = factories.pipelines.list(options).await?;
    Ok(pipelines)
}

/// Create a new pipeline for a repository
///
/// The requester becomes the pipeline's first admin. If the sync after
/// creation fails the pipeline stays stored and the call reports an error.
pub async fn create_pipeline(
    factories: &Factories,
    scm: &dyn ScmProvider,
    req: CreatePipeline,
    username: &str,
    request_path: &str,
) -> Result<Created<Pipeline>> {
    let scm_url = validate_scm_url(&req.scm_url)?;
    let gate = AuthorizationGate::new(factories.users.as_ref(), scm);

    let user = gate
        .resolve_user(username)
        .await
        .map_err(|e| e.classify(Denial::Unauthorized))?;

    // Repository identity and the uniqueness check only need the URL
    let (repo, existing) = tokio::try_join!(
        async {
            scm.get_repo_id(&scm_url, user.unseal_token())
                .await
                .map_err(Error::from)
        },
        async {
            factories
                .pipelines
                .find_by_scm_url(&scm_url)
                .await
                .map_err(Error::from)
        },
    )?;

    if let Some(existing) = existing {
        return Err(Error::Conflict(format!(
            "Pipeline already exists with the ID: {}",
            existing.id
        )));
    }

    gate.check(&user, Capability::Admin, &scm_url)
        .await
        .map_err(|e| e.classify(Denial::Unauthorized))?;

    let pipeline = factories
        .pipelines
        .create(NewPipeline {
            scm_url,
            scm_repo_id: Some(repo.id),
            admins: BTreeMap::from([(user.username.clone(), true)]),
        })
        .await?;

    tracing::info!("Pipeline created: {} ({})", pipeline.scm_url, pipeline.id);

    if let Err(err) = factories.pipelines.sync(&pipeline).await {
        tracing::error!("Pipeline {} created but sync failed: {}", pipeline.id, err);
        return Err(err.into());
    }

    let id = pipeline.id;
    Ok(Created::at(pipeline, request_path, id))
}

/// Point a pipeline at a new SCM URL and re-sync it
///
/// `capability` is required on the current repository and, when the URL
/// changes, on the new one as well.
pub async fn update_pipeline(
    factories: &Factories,
    scm: &dyn ScmProvider,
    id: Uuid,
    req: UpdatePipeline,
    username: &str,
    capability: Capability,
) -> Result<Pipeline> {
    let scm_url = validate_scm_url(&req.scm_url)?;

    let (pipeline, user) = tokio::try_join!(factories.pipelines.get(id), factories.users.get(username))?;
    let pipeline = pipeline.ok_or_else(pipeline_not_found)?;
    let user = user.ok_or_else(|| Error::NotFound(format!("User {} does not exist", username)))?;

    let gate = AuthorizationGate::new(factories.users.as_ref(), scm);
    gate.check(&user, capability, &pipeline.scm_url)
        .await
        .map_err(|e| e.classify(Denial::Unauthorized))?;

    let scm_repo_id = if scm_url == pipeline.scm_url {
        pipeline.scm_repo_id.clone()
    } else {
        gate.check(&user, capability, &scm_url)
            .await
            .map_err(|e| e.classify(Denial::Unauthorized))?;
        Some(scm.get_repo_id(&scm_url, user.unseal_token()).await?.id)
    };

    let updated = factories
        .pipelines
        .update(
            id,
            PipelinePatch {
                scm_url,
                scm_repo_id,
            },
        )
        .await?
        .ok_or_else(pipeline_not_found)?;

    tracing::info!("Pipeline updated: {} ({})", updated.scm_url, updated.id);

    factories.pipelines.sync(&updated).await?;

    Ok(updated)
}

/// Delete a pipeline; requires admin rights on its repository
pub async fn remove_pipeline(
    factories: &Factories,
    scm: &dyn ScmProvider,
    id: Uuid,
    username: &str,
) -> Result<()> {
    let (pipeline, user) = tokio::try_join!(factories.pipelines.get(id), factories.users.get(username))?;
    let pipeline = pipeline.ok_or_else(pipeline_not_found)?;
    let user = user.ok_or_else(|| Error::NotFound(format!("User {} does not exist", username)))?;

    AuthorizationGate::new(factories.users.as_ref(), scm)
        .check(&user, Capability::Admin, &pipeline.scm_url)
        .await
        .map_err(|e| e.classify(Denial::Unauthorized))?;

    factories.pipelines.remove(id).await?;

    tracing::info!("Pipeline deleted: {}", id);

    Ok(())
}

/// Raw query parameters of a pipeline's job listing
#[derive(Debug, Clone, Copy, Default)]
pub struct JobsParams<'a> {
    pub page: Option<&'a str>,
    pub count: Option<&'a str>,
    pub archived: Option<&'a str>,
}

/// List the jobs of a pipeline
pub async fn list_pipeline_jobs(
    factories: &Factories,
    id: Uuid,
    params: JobsParams<'_>,
) -> Result<Vec<Job>> {
    let query = JobQuery {
        archived: parse_flag("archived", params.archived, false)?,
        paginate: parse_paginate(params.page, params.count)?,
    };

    let pipeline = get_pipeline(factories, id).await?;
    let jobs = factories.jobs.list_by_pipeline(pipeline.id, query).await?;

    Ok(jobs)
}

// =============================================================================
// Validation
// =============================================================================

/// Check the shape of an SCM URL and return its normalized form
fn validate_scm_url(raw: &str) -> Result<String> {
    if !scm_url::is_valid(raw) {
        return Err(Error::BadRequest(format!(
            "Invalid SCM URL '{}': expected git@host:owner/repo.git#branch",
            raw
        )));
    }

    Ok(scm_url::normalize(raw))
}

fn pipeline_not_found() -> Error {
    Error::NotFound("Pipeline does not exist".to_string())
}
