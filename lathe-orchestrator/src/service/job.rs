//! Job Service

use lathe_core::domain::job::Job;
use lathe_core::dto::list::ListOptions;

use super::Result;
use crate::repository::Factories;

/// List jobs across all pipelines
pub async fn list_jobs(factories: &Factories, options: ListOptions) -> Result<Vec<Job>> {
    let jobs = factories.jobs.list(options).await?;
    Ok(jobs)
}
