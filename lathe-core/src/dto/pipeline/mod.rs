//! Pipeline DTOs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request to create a new pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePipeline {
    pub scm_url: String,
}

/// Request to update an existing pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePipeline {
    pub scm_url: String,
}

/// Creation payload handed to the pipeline factory
#[derive(Debug, Clone, PartialEq)]
pub struct NewPipeline {
    pub scm_url: String,
    pub scm_repo_id: Option<String>,
    pub admins: BTreeMap<String, bool>,
}

/// Mutation applied by the pipeline factory on update
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinePatch {
    pub scm_url: String,
    pub scm_repo_id: Option<String>,
}
