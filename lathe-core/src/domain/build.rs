//! Build domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Build record
///
/// Builds are created by the API and only read afterwards; status
/// transitions belong to the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: Uuid,
    pub job_id: Uuid,
    pub number: i64,
    pub status: BuildStatus,
    pub username: String,
    pub api_uri: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Build execution status
///
/// Statuses are stored and serialized upper-case. Values the executor
/// reports that this enumeration does not know are kept verbatim in
/// `Other` so a read never fails on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BuildStatus {
    Created,
    Queued,
    Blocked,
    Running,
    Success,
    Failure,
    Aborted,
    Unstable,
    Disabled,
    Other(String),
}

impl BuildStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BuildStatus::Created => "CREATED",
            BuildStatus::Queued => "QUEUED",
            BuildStatus::Blocked => "BLOCKED",
            BuildStatus::Running => "RUNNING",
            BuildStatus::Success => "SUCCESS",
            BuildStatus::Failure => "FAILURE",
            BuildStatus::Aborted => "ABORTED",
            BuildStatus::Unstable => "UNSTABLE",
            BuildStatus::Disabled => "DISABLED",
            BuildStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for BuildStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "CREATED" => BuildStatus::Created,
            "QUEUED" => BuildStatus::Queued,
            "BLOCKED" => BuildStatus::Blocked,
            "RUNNING" => BuildStatus::Running,
            "SUCCESS" => BuildStatus::Success,
            "FAILURE" => BuildStatus::Failure,
            "ABORTED" => BuildStatus::Aborted,
            "UNSTABLE" => BuildStatus::Unstable,
            "DISABLED" => BuildStatus::Disabled,
            _ => BuildStatus::Other(raw),
        }
    }
}

impl From<&str> for BuildStatus {
    fn from(raw: &str) -> Self {
        BuildStatus::from(raw.to_string())
    }
}

impl From<BuildStatus> for String {
    fn from(status: BuildStatus) -> Self {
        match status {
            BuildStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
