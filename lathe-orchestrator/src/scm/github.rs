//! GitHub SCM provider
//!
//! Talks to the GitHub REST API with the user's own token, so the answers
//! reflect exactly what that user can see and do.

use async_trait::async_trait;
use lathe_core::domain::permission::Permissions;
use lathe_core::scm_url::ScmLocator;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::{RepoIdentity, ScmError, ScmProvider, ScmStats};

/// GitHub implementation of [`ScmProvider`]
pub struct GithubScm {
    client: Client,
    api_url: String,
    requests: AtomicU64,
    errors: AtomicU64,
}

impl GithubScm {
    /// Create a provider for the API at `api_url` (e.g. "https://api.github.com")
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ScmError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lathe-orchestrator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(api_url, client))
    }

    pub fn with_client(api_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    fn repo_url(&self, locator: &ScmLocator) -> String {
        format!("{}/repos/{}/{}", self.api_url, locator.owner, locator.repo)
    }

    /// Fetch repository metadata; `None` when GitHub answers 404, which is
    /// also what it answers for private repositories the token cannot see.
    async fn fetch_repo(
        &self,
        token: &str,
        locator: &ScmLocator,
    ) -> Result<Option<RepoResponse>, ScmError> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let result = self.send(token, locator).await;
        if result.is_err() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    async fn send(
        &self,
        token: &str,
        locator: &ScmLocator,
    ) -> Result<Option<RepoResponse>, ScmError> {
        let response = self
            .client
            .get(self.repo_url(locator))
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ScmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Some(response.json::<RepoResponse>().await?))
    }
}

fn locate(scm_url: &str) -> Result<ScmLocator, ScmError> {
    ScmLocator::parse(scm_url).ok_or_else(|| ScmError::InvalidUrl(scm_url.to_string()))
}

#[async_trait]
impl ScmProvider for GithubScm {
    async fn get_permissions(&self, token: &str, scm_url: &str) -> Result<Permissions, ScmError> {
        let locator = locate(scm_url)?;

        let permissions = self
            .fetch_repo(token, &locator)
            .await?
            .and_then(|repo| repo.permissions)
            .unwrap_or_else(Permissions::none);

        tracing::debug!(
            "Permissions for {}/{}: {:?}",
            locator.owner,
            locator.repo,
            permissions
        );

        Ok(permissions)
    }

    async fn get_repo_id(&self, scm_url: &str, token: &str) -> Result<RepoIdentity, ScmError> {
        let locator = locate(scm_url)?;

        let repo = self
            .fetch_repo(token, &locator)
            .await?
            .ok_or_else(|| ScmError::Api {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: format!("Repository {}/{} not found", locator.owner, locator.repo),
            })?;

        Ok(RepoIdentity {
            id: format!("{}:{}:{}", locator.host, repo.id, locator.branch),
            name: repo.full_name,
            branch: locator.branch,
        })
    }

    fn stats(&self) -> ScmStats {
        ScmStats {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    id: u64,
    full_name: String,
    #[serde(default)]
    permissions: Option<Permissions>,
}
