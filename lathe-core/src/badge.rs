//! Build badges
//!
//! A badge is the pair (status, color) summarizing the latest build of a
//! pipeline. It is rendered into a URL template such as
//! `https://img.shields.io/badge/build-{{status}}-{{color}}.svg`.

use crate::domain::build::BuildStatus;

/// Badge colors understood by badge renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Green,
    Blue,
    Red,
    Yellow,
    LightGrey,
}

impl BadgeColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeColor::Green => "green",
            BadgeColor::Blue => "blue",
            BadgeColor::Red => "red",
            BadgeColor::Yellow => "yellow",
            BadgeColor::LightGrey => "lightgrey",
        }
    }

    /// Color for a build status. Any status not listed maps to light grey.
    pub fn for_status(status: &BuildStatus) -> Self {
        match status {
            BuildStatus::Success => BadgeColor::Green,
            BuildStatus::Queued | BuildStatus::Blocked | BuildStatus::Running => BadgeColor::Blue,
            BuildStatus::Failure | BuildStatus::Aborted => BadgeColor::Red,
            BuildStatus::Unstable => BadgeColor::Yellow,
            BuildStatus::Created | BuildStatus::Disabled | BuildStatus::Other(_) => {
                BadgeColor::LightGrey
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub status: String,
    pub color: BadgeColor,
}

impl Badge {
    /// Badge shown when no build can be found
    pub fn unknown() -> Self {
        Self {
            status: "unknown".to_string(),
            color: BadgeColor::LightGrey,
        }
    }

    /// Badge for a build status
    ///
    /// Statuses that cannot appear verbatim in a URL path segment fall back
    /// to [`Badge::unknown`].
    pub fn for_status(status: &BuildStatus) -> Self {
        let label = status.as_str().to_lowercase();

        if label.is_empty() || !label.chars().all(is_url_safe) {
            return Self::unknown();
        }

        Self {
            status: label,
            color: BadgeColor::for_status(status),
        }
    }

    /// Substitute `{{status}}` and `{{color}}` in `template`
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{{status}}", &self.status)
            .replace("{{color}}", self.color.as_str())
    }
}

/// Unreserved URL characters
fn is_url_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}
