//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Each entity has a factory trait with a PostgreSQL implementation next to
//! it; `memory` implements every trait over in-process tables.
//!
//! All factories are trait-based so orchestrators can be exercised against
//! any backing store. A lookup that finds nothing returns `Ok(None)`; errors
//! are reserved for store failures.

pub mod build;
pub mod job;
pub mod memory;
pub mod pipeline;
pub mod secret;
pub mod user;

use lathe_core::domain::user::User;
use sqlx::PgPool;
use std::sync::Arc;

pub use build::{BuildFactory, PgBuildFactory};
pub use job::{JobFactory, PgJobFactory};
pub use memory::MemoryStore;
pub use pipeline::{PgPipelineFactory, PipelineFactory};
pub use secret::{PgSecretFactory, SecretFactory};
pub use user::{PgUserFactory, UserFactory};

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The set of resource factories one request works against
#[derive(Clone)]
pub struct Factories {
    pub pipelines: Arc<dyn PipelineFactory>,
    pub jobs: Arc<dyn JobFactory>,
    pub builds: Arc<dyn BuildFactory>,
    pub users: Arc<dyn UserFactory>,
    pub secrets: Arc<dyn SecretFactory>,
}

impl Factories {
    /// Factories backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            pipelines: Arc::new(PgPipelineFactory::new(pool.clone())),
            jobs: Arc::new(PgJobFactory::new(pool.clone())),
            builds: Arc::new(PgBuildFactory::new(pool.clone())),
            users: Arc::new(PgUserFactory::new(pool.clone())),
            secrets: Arc::new(PgSecretFactory::new(pool)),
        }
    }

    /// Factories backed by a single in-memory store
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            pipelines: store.clone(),
            jobs: store.clone(),
            builds: store.clone(),
            users: store.clone(),
            secrets: store,
        }
    }

    /// Create or refresh each user's token
    pub async fn provision_users(&self, users: &[User]) -> StoreResult<()> {
        for user in users {
            self.users.create(&user.username, user.token.clone()).await?;
            tracing::info!("Provisioned user {}", user.username);
        }

        Ok(())
    }
}

/// Map a unique-constraint violation to [`StoreError::Conflict`]
fn conflict_or(err: sqlx::Error, message: impl FnOnce() -> String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(message()),
        _ => StoreError::Database(err),
    }
}

/// SQL ordering keyword for a listing
fn order_keyword(sort: lathe_core::dto::list::SortOrder) -> &'static str {
    match sort {
        lathe_core::dto::list::SortOrder::Ascending => "ASC",
        lathe_core::dto::list::SortOrder::Descending => "DESC",
    }
}
