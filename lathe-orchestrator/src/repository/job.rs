//! Job Repository
//!
//! Handles all database operations related to jobs.
//! Jobs are created and archived by pipeline sync, never directly.

use async_trait::async_trait;
use lathe_core::domain::job::Job;
use lathe_core::dto::list::{JobQuery, ListOptions};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreResult, order_keyword};

/// Resource factory for jobs
#[async_trait]
pub trait JobFactory: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Job>>;

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Job>>;

    /// Jobs of one pipeline matching the archived flag, oldest first
    async fn list_by_pipeline(&self, pipeline_id: Uuid, query: JobQuery) -> StoreResult<Vec<Job>>;
}

/// PostgreSQL implementation of [`JobFactory`]
pub struct PgJobFactory {
    pool: PgPool,
}

impl PgJobFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobFactory for PgJobFactory {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, pipeline_id, name, archived, created_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Job>> {
        let sql = format!(
            r#"
            SELECT id, pipeline_id, name, archived, created_at
            FROM jobs
            ORDER BY created_at {}
            LIMIT $1 OFFSET $2
            "#,
            order_keyword(options.sort)
        );

        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(i64::from(options.paginate.count))
            .bind(options.paginate.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_by_pipeline(&self, pipeline_id: Uuid, query: JobQuery) -> StoreResult<Vec<Job>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, pipeline_id, name, archived, created_at
            FROM jobs
            WHERE pipeline_id = $1 AND archived = $2
            ORDER BY created_at ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(pipeline_id)
        .bind(query.archived)
        .bind(i64::from(query.paginate.count))
        .bind(query.paginate.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
pub(super) struct JobRow {
    id: Uuid,
    pipeline_id: Uuid,
    name: String,
    archived: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            pipeline_id: row.pipeline_id,
            name: row.name,
            archived: row.archived,
            created_at: row.created_at,
        }
    }
}
