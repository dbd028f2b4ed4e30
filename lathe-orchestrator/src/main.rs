use anyhow::Context;
use lathe_orchestrator::api::{self, AppState};
use lathe_orchestrator::config::Config;
use lathe_orchestrator::db;
use lathe_orchestrator::repository::{Factories, MemoryStore};
use lathe_orchestrator::scm::GithubScm;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lathe_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lathe Orchestrator...");

    let config = Config::from_env()?;
    config.validate()?;

    let factories = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");

            let pool = db::create_pool(database_url)
                .await
                .context("Failed to create database pool")?;

            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Database ready");
            Factories::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on exit");
            Factories::in_memory(Arc::new(MemoryStore::new()))
        }
    };

    factories
        .provision_users(&config.users)
        .await
        .context("Failed to provision users")?;

    let scm = GithubScm::new(config.scm_api_url.clone(), config.scm_timeout)
        .context("Failed to build SCM client")?;

    let addr = config.bind_addr.clone();
    let app = api::create_router(AppState {
        factories,
        scm: Arc::new(scm),
        config: Arc::new(config),
    });

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
