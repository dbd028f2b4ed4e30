//! Pipeline Repository
//!
//! Handles all database operations related to pipelines, including the
//! `sync` action that reconciles a pipeline's jobs.

use async_trait::async_trait;
use lathe_core::domain::job::{Job, MAIN_JOB};
use lathe_core::domain::pipeline::Pipeline;
use lathe_core::dto::list::ListOptions;
use lathe_core::dto::pipeline::{NewPipeline, PipelinePatch};
use sqlx::PgPool;
use sqlx::types::Json;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::job::JobRow;
use super::{StoreResult, conflict_or, order_keyword};

/// Resource factory for pipelines
#[async_trait]
pub trait PipelineFactory: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Pipeline>>;

    /// Look a pipeline up by its normalized SCM URL
    async fn find_by_scm_url(&self, scm_url: &str) -> StoreResult<Option<Pipeline>>;

    /// Create a pipeline; a second pipeline for the same SCM URL is a
    /// [`super::StoreError::Conflict`].
    async fn create(&self, new: NewPipeline) -> StoreResult<Pipeline>;

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Pipeline>>;

    /// Apply `patch`; `None` when the pipeline no longer exists
    async fn update(&self, id: Uuid, patch: PipelinePatch) -> StoreResult<Option<Pipeline>>;

    /// Delete a pipeline with its jobs, builds and secrets
    async fn remove(&self, id: Uuid) -> StoreResult<()>;

    /// Reconcile the pipeline's jobs: the `main` job exists and is active.
    ///
    /// Idempotent. Returns the pipeline's jobs, oldest first.
    async fn sync(&self, pipeline: &Pipeline) -> StoreResult<Vec<Job>>;
}

/// PostgreSQL implementation of [`PipelineFactory`]
pub struct PgPipelineFactory {
    pool: PgPool,
}

impl PgPipelineFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineFactory for PgPipelineFactory {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Pipeline>> {
        let row = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT id, scm_url, scm_repo_id, admins, created_at, updated_at
            FROM pipelines
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_by_scm_url(&self, scm_url: &str) -> StoreResult<Option<Pipeline>> {
        let row = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT id, scm_url, scm_repo_id, admins, created_at, updated_at
            FROM pipelines
            WHERE scm_url = $1
            "#,
        )
        .bind(scm_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn create(&self, new: NewPipeline) -> StoreResult<Pipeline> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO pipelines (id, scm_url, scm_repo_id, admins, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&new.scm_url)
        .bind(&new.scm_repo_id)
        .bind(Json(&new.admins))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("Pipeline already exists for {}", new.scm_url)))?;

        Ok(Pipeline {
            id,
            scm_url: new.scm_url,
            scm_repo_id: new.scm_repo_id,
            admins: new.admins,
            created_at: now,
            updated_at: now,
        })
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Pipeline>> {
        let sql = format!(
            r#"
            SELECT id, scm_url, scm_repo_id, admins, created_at, updated_at
            FROM pipelines
            ORDER BY created_at {}
            LIMIT $1 OFFSET $2
            "#,
            order_keyword(options.sort)
        );

        let rows = sqlx::query_as::<_, PipelineRow>(&sql)
            .bind(i64::from(options.paginate.count))
            .bind(options.paginate.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update(&self, id: Uuid, patch: PipelinePatch) -> StoreResult<Option<Pipeline>> {
        let row = sqlx::query_as::<_, PipelineRow>(
            r#"
            UPDATE pipelines
            SET scm_url = $1, scm_repo_id = $2, updated_at = $3
            WHERE id = $4
            RETURNING id, scm_url, scm_repo_id, admins, created_at, updated_at
            "#,
        )
        .bind(&patch.scm_url)
        .bind(&patch.scm_repo_id)
        .bind(chrono::Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("Pipeline already exists for {}", patch.scm_url)))?;

        Ok(row.map(|r| r.into()))
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM pipelines WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn sync(&self, pipeline: &Pipeline) -> StoreResult<Vec<Job>> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, pipeline_id, name, archived, created_at)
            VALUES ($1, $2, $3, FALSE, $4)
            ON CONFLICT (pipeline_id, name) DO UPDATE SET archived = FALSE
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pipeline.id)
        .bind(MAIN_JOB)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, pipeline_id, name, archived, created_at
            FROM jobs
            WHERE pipeline_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(pipeline.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    id: Uuid,
    scm_url: String,
    scm_repo_id: Option<String>,
    admins: Json<BTreeMap<String, bool>>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PipelineRow> for Pipeline {
    fn from(row: PipelineRow) -> Self {
        Pipeline {
            id: row.id,
            scm_url: row.scm_url,
            scm_repo_id: row.scm_repo_id,
            admins: row.admins.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
