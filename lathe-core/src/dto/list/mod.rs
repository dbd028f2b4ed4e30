//! Listing options shared by every paginated endpoint

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_COUNT: u32 = 50;
pub const MAX_COUNT: u32 = 50;

/// Page selection, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginate {
    pub page: u32,
    pub count: u32,
}

impl Paginate {
    /// Number of records skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.count)
    }
}

impl Default for Paginate {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            count: DEFAULT_COUNT,
        }
    }
}

/// Creation-time ordering of a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub paginate: Paginate,
    pub sort: SortOrder,
}

/// Filter for the jobs of one pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobQuery {
    pub archived: bool,
    pub paginate: Paginate,
}
