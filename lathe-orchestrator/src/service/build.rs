//! Build Service
//!
//! Creating a build: the requester needs push rights on the repository of
//! the job's pipeline, and the pipeline is synced before the build exists.

use lathe_core::domain::build::Build;
use lathe_core::domain::permission::Capability;
use lathe_core::dto::build::NewBuild;
use uuid::Uuid;

use super::auth::{AuthorizationGate, Denial};
use super::{Created, Error, Result};
use crate::repository::Factories;
use crate::scm::ScmProvider;

/// Who asked for the build and where the request came in
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub job_id: Uuid,
    pub username: &'a str,
    pub api_uri: &'a str,
    pub request_path: &'a str,
}

/// Create a build of a job
pub async fn create_build(
    factories: &Factories,
    scm: &dyn ScmProvider,
    req: BuildRequest<'_>,
) -> Result<Created<Build>> {
    // Job and user are independent lookups
    let (job, user) = tokio::try_join!(
        factories.jobs.get(req.job_id),
        factories.users.get(req.username)
    )?;

    let job = job.ok_or_else(|| Error::NotFound(format!("Job {} does not exist", req.job_id)))?;
    let user =
        user.ok_or_else(|| Error::NotFound(format!("User {} does not exist", req.username)))?;

    // The SCM URL lives on the pipeline
    let pipeline = factories
        .pipelines
        .get(job.pipeline_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Pipeline {} does not exist", job.pipeline_id)))?;

    AuthorizationGate::new(factories.users.as_ref(), scm)
        .check(&user, Capability::Push, &pipeline.scm_url)
        .await
        .map_err(|e| e.classify(Denial::Unauthorized))?;

    factories.pipelines.sync(&pipeline).await?;

    let build = factories
        .builds
        .create(NewBuild {
            job_id: job.id,
            api_uri: req.api_uri.to_string(),
            username: user.username,
        })
        .await?;

    tracing::info!(
        "Build {} (#{}) created for job {} by {}",
        build.id,
        build.number,
        build.job_id,
        build.username
    );

    let id = build.id;
    Ok(Created::at(build, req.request_path, id))
}

/// Get a build by ID
pub async fn get_build(factories: &Factories, id: Uuid) -> Result<Build> {
    factories
        .builds
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Build does not exist".to_string()))
}
