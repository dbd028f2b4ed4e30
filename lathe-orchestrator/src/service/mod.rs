//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services orchestrate between factories, the authorization gate and the
//! SCM provider, and classify every failure into [`Error`].

pub mod auth;
pub mod badge;
pub mod build;
pub mod job;
pub mod pipeline;
pub mod secret;

// Re-export for convenience
pub use badge as badge_service;
pub use build as build_service;
pub use job as job_service;
pub use pipeline as pipeline_service;
pub use secret as secret_service;

use lathe_core::dto::list::{
    DEFAULT_COUNT, DEFAULT_PAGE, ListOptions, MAX_COUNT, Paginate, SortOrder,
};

use crate::repository::StoreError;
use crate::scm::ScmError;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    /// Capability missing; reported as 401
    #[error("{0}")]
    Unauthorized(String),

    /// Capability missing for a known requester; reported as 403
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("store failure: {0}")]
    Store(StoreError),

    #[error("SCM failure: {0}")]
    Scm(#[from] ScmError),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => Error::Conflict(msg),
            other => Error::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A newly created entity and where it can be fetched from
#[derive(Debug, Clone)]
pub struct Created<T> {
    pub entity: T,
    pub location: String,
}

impl<T> Created<T> {
    /// `location` is `request_path` followed by `id`
    pub fn at(entity: T, request_path: &str, id: impl std::fmt::Display) -> Self {
        Self {
            entity,
            location: format!("{}/{}", request_path.trim_end_matches('/'), id),
        }
    }
}

// =============================================================================
// Query parsing
// =============================================================================

/// Validate raw `page`, `count` and `sort` query values
pub fn parse_list_options(
    page: Option<&str>,
    count: Option<&str>,
    sort: Option<&str>,
) -> Result<ListOptions> {
    let sort = match sort {
        None => SortOrder::default(),
        Some("ascending") => SortOrder::Ascending,
        Some("descending") => SortOrder::Descending,
        Some(other) => {
            return Err(Error::BadRequest(format!(
                "sort must be 'ascending' or 'descending', got '{}'",
                other
            )));
        }
    };

    Ok(ListOptions {
        paginate: parse_paginate(page, count)?,
        sort,
    })
}

/// Validate raw `page` and `count` query values
pub fn parse_paginate(page: Option<&str>, count: Option<&str>) -> Result<Paginate> {
    let page = parse_number("page", page, DEFAULT_PAGE)?;
    let count = parse_number("count", count, DEFAULT_COUNT)?;

    if page < 1 {
        return Err(Error::BadRequest("page must be at least 1".to_string()));
    }

    if !(1..=MAX_COUNT).contains(&count) {
        return Err(Error::BadRequest(format!(
            "count must be between 1 and {}",
            MAX_COUNT
        )));
    }

    Ok(Paginate { page, count })
}

fn parse_number(name: &str, raw: Option<&str>, default: u32) -> Result<u32> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::BadRequest(format!("{} must be a number, got '{}'", name, raw))),
    }
}

/// Parse a boolean query flag; anything but `true`/`false` is rejected
pub fn parse_flag(name: &str, raw: Option<&str>, default: bool) -> Result<bool> {
    match raw {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(Error::BadRequest(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}
