//! Secret domain types

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

/// A pipeline secret
///
/// The value never leaves the API through read or list paths; see
/// [`crate::dto::secret::SecretView`] for the response shape.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    pub name: String,
    pub value: String,
    pub allow_in_pr: bool,
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("id", &self.id)
            .field("pipeline_id", &self.pipeline_id)
            .field("name", &self.name)
            .field("value", &"***")
            .field("allow_in_pr", &self.allow_in_pr)
            .finish()
    }
}

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z_][A-Z0-9_]*$").expect("secret name pattern is valid")
});

impl Secret {
    /// Names are environment-variable style: upper case, digits and underscores
    pub fn is_valid_name(name: &str) -> bool {
        NAME_PATTERN.is_match(name)
    }
}
