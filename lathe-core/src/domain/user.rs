//! User domain types

use std::fmt;

/// An API user
///
/// Users are identified by their SCM username and carry the SCM access token
/// the orchestrators hand to the permission oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub token: SealedToken,
}

impl User {
    pub fn new(username: impl Into<String>, token: SealedToken) -> Self {
        Self {
            username: username.into(),
            token,
        }
    }

    /// The plaintext SCM token, for calls to the SCM provider only
    pub fn unseal_token(&self) -> &str {
        self.token.unseal()
    }
}

/// SCM access token as held by the user store
///
/// Never printed; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedToken(String);

impl SealedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn unseal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SealedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SealedToken(***)")
    }
}
