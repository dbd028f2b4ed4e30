//! SCM Module
//!
//! The permission oracle: answers what a user may do on a repository and
//! what the repository's stable identity is. Orchestrators only see the
//! [`ScmProvider`] trait.

pub mod github;

use async_trait::async_trait;
use lathe_core::domain::permission::Permissions;
use serde::Serialize;

pub use github::GithubScm;

/// SCM error type
#[derive(Debug, thiserror::Error)]
pub enum ScmError {
    #[error("invalid SCM URL: {0}")]
    InvalidUrl(String),

    #[error("SCM request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SCM API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Stable identity of a repository branch, `<host>:<repo id>:<branch>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoIdentity {
    pub id: String,
    pub name: String,
    pub branch: String,
}

/// Request counters reported on `/stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScmStats {
    pub requests: u64,
    pub errors: u64,
}

#[async_trait]
pub trait ScmProvider: Send + Sync {
    /// Capability set of the token's owner on the repository at `scm_url`
    async fn get_permissions(&self, token: &str, scm_url: &str) -> Result<Permissions, ScmError>;

    async fn get_repo_id(&self, scm_url: &str, token: &str) -> Result<RepoIdentity, ScmError>;

    fn stats(&self) -> ScmStats;
}
