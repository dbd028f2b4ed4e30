//! Secret Repository
//!
//! Values are stored as handed over; protecting them at rest is the
//! database's concern.

use async_trait::async_trait;
use lathe_core::domain::secret::Secret;
use lathe_core::dto::secret::CreateSecret;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreResult, conflict_or};

/// Resource factory for secrets
#[async_trait]
pub trait SecretFactory: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Secret>>;

    /// Secret names are unique per pipeline
    async fn create(&self, new: CreateSecret) -> StoreResult<Secret>;

    /// Secrets of one pipeline in creation order
    async fn list_by_pipeline(&self, pipeline_id: Uuid) -> StoreResult<Vec<Secret>>;

    async fn remove(&self, id: Uuid) -> StoreResult<()>;
}

/// PostgreSQL implementation of [`SecretFactory`]
pub struct PgSecretFactory {
    pool: PgPool,
}

impl PgSecretFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecretFactory for PgSecretFactory {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Secret>> {
        let row = sqlx::query_as::<_, SecretRow>(
            "SELECT id, pipeline_id, name, value, allow_in_pr FROM secrets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into()))
    }

    async fn create(&self, new: CreateSecret) -> StoreResult<Secret> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO secrets (id, pipeline_id, name, value, allow_in_pr, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(new.pipeline_id)
        .bind(&new.name)
        .bind(&new.value)
        .bind(new.allow_in_pr)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or(e, || format!("Secret {} already exists", new.name)))?;

        Ok(Secret {
            id,
            pipeline_id: new.pipeline_id,
            name: new.name,
            value: new.value,
            allow_in_pr: new.allow_in_pr,
        })
    }

    async fn list_by_pipeline(&self, pipeline_id: Uuid) -> StoreResult<Vec<Secret>> {
        let rows = sqlx::query_as::<_, SecretRow>(
            r#"
            SELECT id, pipeline_id, name, value, allow_in_pr
            FROM secrets
            WHERE pipeline_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(pipeline_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM secrets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct SecretRow {
    id: Uuid,
    pipeline_id: Uuid,
    name: String,
    value: String,
    allow_in_pr: bool,
}

impl From<SecretRow> for Secret {
    fn from(row: SecretRow) -> Self {
        Secret {
            id: row.id,
            pipeline_id: row.pipeline_id,
            name: row.name,
            value: row.value,
            allow_in_pr: row.allow_in_pr,
        }
    }
}
