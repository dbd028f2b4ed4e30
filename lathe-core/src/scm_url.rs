//! SCM URL handling
//!
//! A pipeline is keyed by the canonical form of its repository locator, and
//! the same canonical form is what the permission oracle is asked about.

use regex::Regex;
use std::sync::LazyLock;

/// Reference appended when a locator names no branch
pub const DEFAULT_REF: &str = "master";

static SCM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^git@([^:/\s]+):([^/\s]+)/([^/\s#]+?)(?:\.git)?(?:#(\S*))?$")
        .expect("SCM URL pattern is valid")
});

/// Canonical form of a repository locator.
///
/// Lower-cases everything before the `#` fragment, keeps the reference as
/// given, and appends `#master` when the reference is missing or empty.
/// Total and idempotent.
pub fn normalize(raw: &str) -> String {
    let raw = raw.trim();
    let (repository, reference) = raw.split_once('#').unwrap_or((raw, ""));
    let reference = if reference.is_empty() {
        DEFAULT_REF
    } else {
        reference
    };

    format!("{}#{}", repository.to_lowercase(), reference)
}

/// Whether `raw` has the `git@host:owner/repo[.git][#ref]` shape
pub fn is_valid(raw: &str) -> bool {
    SCM_URL.is_match(raw.trim())
}

/// Parsed parts of a repository locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmLocator {
    pub host: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl ScmLocator {
    /// Parse a locator; the result is built from its canonical form.
    pub fn parse(raw: &str) -> Option<Self> {
        let canonical = normalize(raw);
        let captures = SCM_URL.captures(&canonical)?;

        Some(Self {
            host: captures[1].to_string(),
            owner: captures[2].to_string(),
            repo: captures[3].to_string(),
            branch: captures
                .get(4)
                .map(|m| m.as_str())
                .filter(|b| !b.is_empty())
                .unwrap_or(DEFAULT_REF)
                .to_string(),
        })
    }
}
