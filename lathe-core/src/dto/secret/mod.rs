//! Secret DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::secret::Secret;

/// Request to store a secret on a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecret {
    pub pipeline_id: Uuid,
    pub name: String,
    pub value: String,
    #[serde(rename = "allowInPR", default)]
    pub allow_in_pr: bool,
}

/// Secret as exposed by the API: everything but the value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretView {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    #[serde(rename = "allowInPR")]
    pub allow_in_pr: bool,
}

impl From<&Secret> for SecretView {
    fn from(secret: &Secret) -> Self {
        Self {
            id: secret.id,
            pipeline_id: secret.pipeline_id,
            name: secret.name.clone(),
            allow_in_pr: secret.allow_in_pr,
        }
    }
}
