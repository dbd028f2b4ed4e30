//! Authorization Gate
//!
//! Decides whether a user holds a capability on a repository by asking the
//! SCM provider with the user's own token. The gate only reads.

use lathe_core::domain::permission::Capability;
use lathe_core::domain::user::User;

use super::Error;
use crate::repository::{StoreError, UserFactory};
use crate::scm::{ScmError, ScmProvider};

/// Why the gate refused
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User {0} does not exist")]
    UserNotFound(String),

    #[error("User {username} does not have {capability} permission for this repo")]
    Denied {
        username: String,
        capability: Capability,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scm(#[from] ScmError),
}

/// How an operation reports a denial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthorized,
    Forbidden,
}

impl AuthError {
    /// Classify into the service taxonomy, reporting denials as `denial`
    pub fn classify(self, denial: Denial) -> Error {
        match self {
            AuthError::UserNotFound(_) => Error::NotFound(self.to_string()),
            AuthError::Denied { .. } => match denial {
                Denial::Unauthorized => Error::Unauthorized(self.to_string()),
                Denial::Forbidden => Error::Forbidden(self.to_string()),
            },
            AuthError::Store(err) => err.into(),
            AuthError::Scm(err) => err.into(),
        }
    }
}

pub struct AuthorizationGate<'a> {
    users: &'a dyn UserFactory,
    scm: &'a dyn ScmProvider,
}

impl<'a> AuthorizationGate<'a> {
    pub fn new(users: &'a dyn UserFactory, scm: &'a dyn ScmProvider) -> Self {
        Self { users, scm }
    }

    /// Resolve the acting user
    pub async fn resolve_user(&self, username: &str) -> Result<User, AuthError> {
        self.users
            .get(username)
            .await?
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))
    }

    /// Check an already resolved user against the repository at `scm_url`
    pub async fn check(
        &self,
        user: &User,
        capability: Capability,
        scm_url: &str,
    ) -> Result<(), AuthError> {
        let permissions = self
            .scm
            .get_permissions(user.unseal_token(), scm_url)
            .await?;

        if !permissions.allows(capability) {
            tracing::info!(
                "Denied {} on {} for user {}",
                capability,
                scm_url,
                user.username
            );
            return Err(AuthError::Denied {
                username: user.username.clone(),
                capability,
            });
        }

        Ok(())
    }

    /// Resolve `username` and check it; yields the resolved user
    pub async fn authorize(
        &self,
        username: &str,
        capability: Capability,
        scm_url: &str,
    ) -> Result<User, AuthError> {
        let user = self.resolve_user(username).await?;
        self.check(&user, capability, scm_url).await?;

        Ok(user)
    }
}
