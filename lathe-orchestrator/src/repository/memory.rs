//! In-memory store
//!
//! Implements every factory trait over process-local tables. Used when no
//! database is configured and by the test suite. All writes happen under one
//! lock, so uniqueness checks and inserts are atomic.

use async_trait::async_trait;
use lathe_core::domain::build::{Build, BuildStatus};
use lathe_core::domain::job::{Job, MAIN_JOB};
use lathe_core::domain::pipeline::Pipeline;
use lathe_core::domain::secret::Secret;
use lathe_core::domain::user::{SealedToken, User};
use lathe_core::dto::build::NewBuild;
use lathe_core::dto::list::{JobQuery, ListOptions, Paginate, SortOrder};
use lathe_core::dto::pipeline::{NewPipeline, PipelinePatch};
use lathe_core::dto::secret::CreateSecret;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BuildFactory, JobFactory, PipelineFactory, SecretFactory, StoreError, StoreResult, UserFactory,
};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    // Vectors keep insertion order, which is creation order.
    pipelines: Vec<Pipeline>,
    jobs: Vec<Job>,
    builds: Vec<Build>,
    secrets: Vec<Secret>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Apply creation-time ordering and pagination to rows held oldest first
fn page<T>(rows: impl DoubleEndedIterator<Item = T>, options: ListOptions) -> Vec<T> {
    match options.sort {
        SortOrder::Ascending => paginate(rows, options.paginate),
        SortOrder::Descending => paginate(rows.rev(), options.paginate),
    }
}

fn paginate<T>(rows: impl Iterator<Item = T>, paginate: Paginate) -> Vec<T> {
    rows.skip(paginate.offset() as usize)
        .take(paginate.count as usize)
        .collect()
}

#[async_trait]
impl PipelineFactory for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Pipeline>> {
        let tables = self.tables.read().await;
        Ok(tables.pipelines.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_scm_url(&self, scm_url: &str) -> StoreResult<Option<Pipeline>> {
        let tables = self.tables.read().await;
        Ok(tables
            .pipelines
            .iter()
            .find(|p| p.scm_url == scm_url)
            .cloned())
    }

    async fn create(&self, new: NewPipeline) -> StoreResult<Pipeline> {
        let mut tables = self.tables.write().await;

        if tables.pipelines.iter().any(|p| p.scm_url == new.scm_url) {
            return Err(StoreError::Conflict(format!(
                "Pipeline already exists for {}",
                new.scm_url
            )));
        }

        let now = chrono::Utc::now();
        let pipeline = Pipeline {
            id: Uuid::new_v4(),
            scm_url: new.scm_url,
            scm_repo_id: new.scm_repo_id,
            admins: new.admins,
            created_at: now,
            updated_at: now,
        };
        tables.pipelines.push(pipeline.clone());

        Ok(pipeline)
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Pipeline>> {
        let tables = self.tables.read().await;
        Ok(page(tables.pipelines.iter().cloned(), options))
    }

    async fn update(&self, id: Uuid, patch: PipelinePatch) -> StoreResult<Option<Pipeline>> {
        let mut tables = self.tables.write().await;

        if tables
            .pipelines
            .iter()
            .any(|p| p.id != id && p.scm_url == patch.scm_url)
        {
            return Err(StoreError::Conflict(format!(
                "Pipeline already exists for {}",
                patch.scm_url
            )));
        }

        let Some(pipeline) = tables.pipelines.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        pipeline.scm_url = patch.scm_url;
        pipeline.scm_repo_id = patch.scm_repo_id;
        pipeline.updated_at = chrono::Utc::now();

        Ok(Some(pipeline.clone()))
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        let job_ids: Vec<Uuid> = tables
            .jobs
            .iter()
            .filter(|j| j.pipeline_id == id)
            .map(|j| j.id)
            .collect();

        tables.builds.retain(|b| !job_ids.contains(&b.job_id));
        tables.jobs.retain(|j| j.pipeline_id != id);
        tables.secrets.retain(|s| s.pipeline_id != id);
        tables.pipelines.retain(|p| p.id != id);

        Ok(())
    }

    async fn sync(&self, pipeline: &Pipeline) -> StoreResult<Vec<Job>> {
        let mut tables = self.tables.write().await;

        match tables
            .jobs
            .iter_mut()
            .find(|j| j.pipeline_id == pipeline.id && j.name == MAIN_JOB)
        {
            Some(job) => job.archived = false,
            None => tables.jobs.push(Job {
                id: Uuid::new_v4(),
                pipeline_id: pipeline.id,
                name: MAIN_JOB.to_string(),
                archived: false,
                created_at: chrono::Utc::now(),
            }),
        }

        Ok(tables
            .jobs
            .iter()
            .filter(|j| j.pipeline_id == pipeline.id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl JobFactory for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        Ok(page(tables.jobs.iter().cloned(), options))
    }

    async fn list_by_pipeline(&self, pipeline_id: Uuid, query: JobQuery) -> StoreResult<Vec<Job>> {
        let tables = self.tables.read().await;
        let jobs = tables
            .jobs
            .iter()
            .filter(|j| j.pipeline_id == pipeline_id && j.archived == query.archived)
            .cloned();

        Ok(paginate(jobs, query.paginate))
    }
}

#[async_trait]
impl BuildFactory for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Build>> {
        let tables = self.tables.read().await;
        Ok(tables.builds.iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, new: NewBuild) -> StoreResult<Build> {
        let mut tables = self.tables.write().await;

        let number = tables
            .builds
            .iter()
            .filter(|b| b.job_id == new.job_id)
            .map(|b| b.number)
            .max()
            .unwrap_or(0)
            + 1;

        let build = Build {
            id: Uuid::new_v4(),
            job_id: new.job_id,
            number,
            status: BuildStatus::Queued,
            username: new.username,
            api_uri: new.api_uri,
            created_at: chrono::Utc::now(),
        };
        tables.builds.push(build.clone());

        Ok(build)
    }

    async fn list_by_job(&self, job_id: Uuid, paginate: Paginate) -> StoreResult<Vec<Build>> {
        let tables = self.tables.read().await;
        let builds = tables
            .builds
            .iter()
            .rev()
            .filter(|b| b.job_id == job_id)
            .cloned();

        Ok(self::paginate(builds, paginate))
    }
}

#[async_trait]
impl UserFactory for MemoryStore {
    async fn get(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(username).cloned())
    }

    async fn create(&self, username: &str, token: SealedToken) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let user = User::new(username, token);
        tables.users.insert(username.to_string(), user.clone());

        Ok(user)
    }
}

#[async_trait]
impl SecretFactory for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Secret>> {
        let tables = self.tables.read().await;
        Ok(tables.secrets.iter().find(|s| s.id == id).cloned())
    }

    async fn create(&self, new: CreateSecret) -> StoreResult<Secret> {
        let mut tables = self.tables.write().await;

        if tables
            .secrets
            .iter()
            .any(|s| s.pipeline_id == new.pipeline_id && s.name == new.name)
        {
            return Err(StoreError::Conflict(format!(
                "Secret {} already exists",
                new.name
            )));
        }

        let secret = Secret {
            id: Uuid::new_v4(),
            pipeline_id: new.pipeline_id,
            name: new.name,
            value: new.value,
            allow_in_pr: new.allow_in_pr,
        };
        tables.secrets.push(secret.clone());

        Ok(secret)
    }

    async fn list_by_pipeline(&self, pipeline_id: Uuid) -> StoreResult<Vec<Secret>> {
        let tables = self.tables.read().await;
        Ok(tables
            .secrets
            .iter()
            .filter(|s| s.pipeline_id == pipeline_id)
            .cloned()
            .collect())
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.secrets.retain(|s| s.id != id);

        Ok(())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Overwrite a build's status, standing in for the executor
    pub async fn set_build_status(&self, id: Uuid, status: BuildStatus) {
        let mut tables = self.tables.write().await;
        if let Some(build) = tables.builds.iter_mut().find(|b| b.id == id) {
            build.status = status;
        }
    }

    pub async fn archive_job(&self, id: Uuid) {
        let mut tables = self.tables.write().await;
        if let Some(job) = tables.jobs.iter_mut().find(|j| j.id == id) {
            job.archived = true;
        }
    }

    pub async fn add_job(&self, pipeline_id: Uuid, name: &str, archived: bool) -> Job {
        let job = Job {
            id: Uuid::new_v4(),
            pipeline_id,
            name: name.to_string(),
            archived,
            created_at: chrono::Utc::now(),
        };
        self.tables.write().await.jobs.push(job.clone());
        job
    }

    pub async fn build_count(&self) -> usize {
        self.tables.read().await.builds.len()
    }
}
