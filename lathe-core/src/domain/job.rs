//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the job every synced pipeline carries
pub const MAIN_JOB: &str = "main";

/// Job record
///
/// Jobs belong to exactly one pipeline and are never deleted by a sync,
/// only archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    pub archived: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
