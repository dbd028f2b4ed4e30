//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Pipeline definition
///
/// A pipeline is identified by its normalized SCM URL: at most one pipeline
/// exists per repository and branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: Uuid,
    pub scm_url: String,
    pub scm_repo_id: Option<String>,
    pub admins: BTreeMap<String, bool>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Pipeline {
    /// Whether `username` is recorded as an admin of this pipeline
    pub fn is_admin(&self, username: &str) -> bool {
        self.admins.get(username).copied().unwrap_or(false)
    }
}
