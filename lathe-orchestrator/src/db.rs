use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// Schema statements, applied in order; each is idempotent
const MIGRATIONS: &[&str] = &[
    // Users and their SCM tokens
    r#"
    CREATE TABLE IF NOT EXISTS users (
        username VARCHAR(255) PRIMARY KEY,
        token TEXT NOT NULL
    )
    "#,
    // One pipeline per normalized SCM URL
    r#"
    CREATE TABLE IF NOT EXISTS pipelines (
        id UUID PRIMARY KEY,
        scm_url TEXT NOT NULL UNIQUE,
        scm_repo_id TEXT,
        admins JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id UUID PRIMARY KEY,
        pipeline_id UUID NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
        name VARCHAR(255) NOT NULL,
        archived BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        UNIQUE (pipeline_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS builds (
        id UUID PRIMARY KEY,
        job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
        number BIGINT NOT NULL,
        status VARCHAR(50) NOT NULL,
        username VARCHAR(255) NOT NULL,
        api_uri TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS secrets (
        id UUID PRIMARY KEY,
        pipeline_id UUID NOT NULL REFERENCES pipelines(id) ON DELETE CASCADE,
        name VARCHAR(255) NOT NULL,
        value TEXT NOT NULL,
        allow_in_pr BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        UNIQUE (pipeline_id, name)
    )
    "#,
    // Build numbers are unique per job; also covers tables created before it
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_builds_job_number ON builds(job_id, number)",
    "CREATE INDEX IF NOT EXISTS idx_jobs_pipeline_id ON jobs(pipeline_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_builds_job_id ON builds(job_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_secrets_pipeline_id ON secrets(pipeline_id)",
];

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
