//! Build DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to start a build of a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuild {
    pub job_id: Uuid,
}

/// Creation payload handed to the build factory
#[derive(Debug, Clone, PartialEq)]
pub struct NewBuild {
    pub job_id: Uuid,
    pub api_uri: String,
    pub username: String,
}
