//! Build Repository
//!
//! Handles all database operations related to builds.

use async_trait::async_trait;
use lathe_core::domain::build::{Build, BuildStatus};
use lathe_core::dto::build::NewBuild;
use lathe_core::dto::list::Paginate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, StoreResult, conflict_or};

/// Inserts tried before a numbering collision is reported as a conflict
const NUMBERING_ATTEMPTS: usize = 3;

/// Resource factory for builds
#[async_trait]
pub trait BuildFactory: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Build>>;

    /// Create a queued build numbered after the job's latest one
    async fn create(&self, new: NewBuild) -> StoreResult<Build>;

    /// Builds of one job, most recent first
    async fn list_by_job(&self, job_id: Uuid, paginate: Paginate) -> StoreResult<Vec<Build>>;
}

/// PostgreSQL implementation of [`BuildFactory`]
pub struct PgBuildFactory {
    pool: PgPool,
}

impl PgBuildFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BuildFactory for PgBuildFactory {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Build>> {
        let row = sqlx::query_as::<_, BuildRow>(
            r#"
            SELECT id, job_id, number, status, username, api_uri, created_at
            FROM builds
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn create(&self, new: NewBuild) -> StoreResult<Build> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let status = BuildStatus::Queued;

        // UNIQUE (job_id, number) rejects a racing insert; renumber and retry
        let mut attempt = 1;
        let number = loop {
            let inserted = sqlx::query_as::<_, (i64,)>(
                r#"
                INSERT INTO builds (id, job_id, number, status, username, api_uri, created_at)
                SELECT $1, $2, COALESCE(MAX(number), 0) + 1, $3, $4, $5, $6
                FROM builds
                WHERE job_id = $2
                RETURNING number
                "#,
            )
            .bind(id)
            .bind(new.job_id)
            .bind(status.as_str())
            .bind(&new.username)
            .bind(&new.api_uri)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_or(e, || format!("Build number taken for job {}", new.job_id)));

            match inserted {
                Ok((number,)) => break number,
                Err(StoreError::Conflict(msg)) if attempt < NUMBERING_ATTEMPTS => {
                    tracing::debug!("{} (attempt {}), retrying", msg, attempt);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        Ok(Build {
            id,
            job_id: new.job_id,
            number,
            status,
            username: new.username,
            api_uri: new.api_uri,
            created_at: now,
        })
    }

    async fn list_by_job(&self, job_id: Uuid, paginate: Paginate) -> StoreResult<Vec<Build>> {
        let rows = sqlx::query_as::<_, BuildRow>(
            r#"
            SELECT id, job_id, number, status, username, api_uri, created_at
            FROM builds
            WHERE job_id = $1
            ORDER BY created_at DESC, number DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(job_id)
        .bind(i64::from(paginate.count))
        .bind(paginate.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct BuildRow {
    id: Uuid,
    job_id: Uuid,
    number: i64,
    status: String,
    username: String,
    api_uri: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<BuildRow> for Build {
    fn from(row: BuildRow) -> Self {
        Build {
            id: row.id,
            job_id: row.job_id,
            number: row.number,
            status: BuildStatus::from(row.status),
            username: row.username,
            api_uri: row.api_uri,
            created_at: row.created_at,
        }
    }
}
