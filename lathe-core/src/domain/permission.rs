//! Repository permission types
//!
//! Capabilities are the named permission flags an SCM provider reports for a
//! user on a repository.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named permission flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Pull,
    Push,
    Admin,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Pull => "pull",
            Capability::Push => "push",
            Capability::Admin => "admin",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pull" => Ok(Capability::Pull),
            "push" => Ok(Capability::Push),
            "admin" => Ok(Capability::Admin),
            other => Err(format!("unknown capability '{}'", other)),
        }
    }
}

/// Capability set reported by the SCM provider for one user/repository pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

impl Permissions {
    /// No rights at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Pull => self.pull,
            Capability::Push => self.push,
            Capability::Admin => self.admin,
        }
    }
}
