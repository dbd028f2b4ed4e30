//! Secret Service
//!
//! Secret values go in through `create_secret` and never come back out:
//! listings and creation responses carry [`SecretView`]s.

use async_trait::async_trait;
use lathe_core::domain::permission::Capability;
use lathe_core::domain::secret::Secret;
use lathe_core::dto::secret::{CreateSecret, SecretView};
use uuid::Uuid;

use super::auth::{AuthorizationGate, Denial};
use super::{Created, Error, Result};
use crate::repository::Factories;
use crate::scm::ScmProvider;

/// Access hook consulted before a secret is removed
#[async_trait]
pub trait AccessCheck: Send + Sync {
    /// Succeeds when `username` holds `capability` on the pipeline
    async fn can_access(&self, username: &str, pipeline_id: Uuid, capability: Capability)
    -> Result<()>;
}

/// [`AccessCheck`] backed by the SCM provider's permissions
pub struct ScmAccessCheck<'a> {
    factories: &'a Factories,
    scm: &'a dyn ScmProvider,
}

impl<'a> ScmAccessCheck<'a> {
    pub fn new(factories: &'a Factories, scm: &'a dyn ScmProvider) -> Self {
        Self { factories, scm }
    }
}

#[async_trait]
impl AccessCheck for ScmAccessCheck<'_> {
    async fn can_access(
        &self,
        username: &str,
        pipeline_id: Uuid,
        capability: Capability,
    ) -> Result<()> {
        let pipeline = self
            .factories
            .pipelines
            .get(pipeline_id)
            .await?
            .ok_or_else(pipeline_not_found)?;

        AuthorizationGate::new(self.factories.users.as_ref(), self.scm)
            .authorize(username, capability, &pipeline.scm_url)
            .await
            .map_err(|e| e.classify(Denial::Forbidden))?;

        Ok(())
    }
}

/// List the secrets of a pipeline, values stripped
pub async fn list_secrets(
    factories: &Factories,
    scm: &dyn ScmProvider,
    pipeline_id: Uuid,
    username: &str,
) -> Result<Vec<SecretView>> {
    let pipeline = factories
        .pipelines
        .get(pipeline_id)
        .await?
        .ok_or_else(pipeline_not_found)?;

    AuthorizationGate::new(factories.users.as_ref(), scm)
        .authorize(username, Capability::Push, &pipeline.scm_url)
        .await
        .map_err(|e| e.classify(Denial::Forbidden))?;

    let secrets = factories.secrets.list_by_pipeline(pipeline.id).await?;

    Ok(secrets.iter().map(SecretView::from).collect())
}

/// Store a secret on a pipeline; requires admin on its repository
pub async fn create_secret(
    factories: &Factories,
    scm: &dyn ScmProvider,
    req: CreateSecret,
    username: &str,
    request_path: &str,
) -> Result<Created<SecretView>> {
    if !Secret::is_valid_name(&req.name) {
        return Err(Error::BadRequest(format!(
            "Secret name '{}' must match ^[A-Z_][A-Z0-9_]*$",
            req.name
        )));
    }

    let pipeline = factories
        .pipelines
        .get(req.pipeline_id)
        .await?
        .ok_or_else(pipeline_not_found)?;

    AuthorizationGate::new(factories.users.as_ref(), scm)
        .authorize(username, Capability::Admin, &pipeline.scm_url)
        .await
        .map_err(|e| e.classify(Denial::Forbidden))?;

    let secret = factories.secrets.create(req).await?;

    tracing::info!("Secret {} added to pipeline {}", secret.name, secret.pipeline_id);

    Ok(Created::at(SecretView::from(&secret), request_path, secret.id))
}

/// Remove a secret once `access` allows it
pub async fn remove_secret(
    factories: &Factories,
    access: &dyn AccessCheck,
    id: Uuid,
    username: &str,
) -> Result<()> {
    let secret = factories
        .secrets
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Secret does not exist".to_string()))?;

    access
        .can_access(username, secret.pipeline_id, Capability::Push)
        .await?;

    factories.secrets.remove(secret.id).await?;

    tracing::info!("Secret {} removed from pipeline {}", secret.name, secret.pipeline_id);

    Ok(())
}

fn pipeline_not_found() -> Error {
    Error::NotFound("Pipeline does not exist".to_string())
}
