//! Test fixtures: a seeded in-memory store, a scripted SCM provider and
//! factories that fail on demand.

use async_trait::async_trait;
use lathe_core::domain::build::Build;
use lathe_core::domain::job::Job;
use lathe_core::domain::permission::Permissions;
use lathe_core::domain::pipeline::Pipeline;
use lathe_core::domain::user::SealedToken;
use lathe_core::dto::build::NewBuild;
use lathe_core::dto::list::{JobQuery, ListOptions, Paginate};
use lathe_core::dto::pipeline::{NewPipeline, PipelinePatch};
use lathe_core::scm_url::ScmLocator;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::repository::{
    BuildFactory, Factories, JobFactory, MemoryStore, PipelineFactory, StoreError, StoreResult,
    UserFactory,
};
use crate::scm::{RepoIdentity, ScmError, ScmProvider, ScmStats};

pub const SCM_URL: &str = "git@github.com:screwdriver-cd/data-model.git#master";
pub const USERNAME: &str = "myself";
pub const TOKEN: &str = "secrettoken";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub factories: Factories,
    pub pipeline: Pipeline,
    pub job: Job,
}

/// A store holding user `myself` and a synced pipeline at [`SCM_URL`]
pub async fn seeded() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let factories = Factories::in_memory(store.clone());

    factories
        .users
        .create(USERNAME, SealedToken::new(TOKEN))
        .await
        .unwrap();

    let pipeline = factories
        .pipelines
        .create(NewPipeline {
            scm_url: SCM_URL.to_string(),
            scm_repo_id: Some("github.com:123456:master".to_string()),
            admins: BTreeMap::from([(USERNAME.to_string(), true)]),
        })
        .await
        .unwrap();

    let job = factories.pipelines.sync(&pipeline).await.unwrap().remove(0);

    Fixture {
        store,
        factories,
        pipeline,
        job,
    }
}

pub fn new_build(job_id: Uuid) -> NewBuild {
    NewBuild {
        job_id,
        api_uri: "http://localhost:8080".to_string(),
        username: USERNAME.to_string(),
    }
}

// =============================================================================
// Scripted SCM provider
// =============================================================================

#[derive(Default)]
pub struct StubScm {
    grants: HashMap<String, Permissions>,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl StubScm {
    pub fn granting(scm_url: &str, permissions: Permissions) -> Self {
        Self::default().with(scm_url, permissions)
    }

    pub fn with(mut self, scm_url: &str, permissions: Permissions) -> Self {
        self.grants.insert(scm_url.to_string(), permissions);
        self
    }

    /// Every call fails with a 500 from the API
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// SCM URLs permissions were asked for, in order
    pub fn permission_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn outage() -> ScmError {
        ScmError::Api {
            status: 500,
            message: "scm is down".to_string(),
        }
    }
}

pub fn push() -> Permissions {
    Permissions {
        push: true,
        pull: true,
        admin: false,
    }
}

pub fn admin() -> Permissions {
    Permissions {
        push: true,
        pull: true,
        admin: true,
    }
}

#[async_trait]
impl ScmProvider for StubScm {
    async fn get_permissions(&self, token: &str, scm_url: &str) -> Result<Permissions, ScmError> {
        assert_eq!(token, TOKEN, "SCM must be called with the unsealed token");
        self.calls.lock().unwrap().push(scm_url.to_string());

        if self.fail {
            return Err(Self::outage());
        }

        Ok(self.grants.get(scm_url).copied().unwrap_or_default())
    }

    async fn get_repo_id(&self, scm_url: &str, _token: &str) -> Result<RepoIdentity, ScmError> {
        if self.fail {
            return Err(Self::outage());
        }

        let locator =
            ScmLocator::parse(scm_url).ok_or_else(|| ScmError::InvalidUrl(scm_url.to_string()))?;

        Ok(RepoIdentity {
            id: format!("{}:123456:{}", locator.host, locator.branch),
            name: format!("{}/{}", locator.owner, locator.repo),
            branch: locator.branch,
        })
    }

    fn stats(&self) -> ScmStats {
        ScmStats {
            requests: self.calls.lock().unwrap().len() as u64,
            errors: 0,
        }
    }
}

// =============================================================================
// Failing factories
// =============================================================================

fn outage() -> StoreError {
    StoreError::Unavailable("datastore is down".to_string())
}

/// Which pipeline operation fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Get,
    Create,
    Sync,
    Remove,
}

/// Delegates to a memory store except for the faulted operation
pub struct FaultyPipelines {
    pub inner: Arc<MemoryStore>,
    pub fault: Fault,
}

#[async_trait]
impl PipelineFactory for FaultyPipelines {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Pipeline>> {
        if self.fault == Fault::Get {
            return Err(outage());
        }
        PipelineFactory::get(self.inner.as_ref(), id).await
    }

    async fn find_by_scm_url(&self, scm_url: &str) -> StoreResult<Option<Pipeline>> {
        if self.fault == Fault::Get {
            return Err(outage());
        }
        self.inner.find_by_scm_url(scm_url).await
    }

    async fn create(&self, new: NewPipeline) -> StoreResult<Pipeline> {
        if self.fault == Fault::Create {
            return Err(outage());
        }
        PipelineFactory::create(self.inner.as_ref(), new).await
    }

    async fn list(&self, options: ListOptions) -> StoreResult<Vec<Pipeline>> {
        PipelineFactory::list(self.inner.as_ref(), options).await
    }

    async fn update(&self, id: Uuid, patch: PipelinePatch) -> StoreResult<Option<Pipeline>> {
        self.inner.update(id, patch).await
    }

    async fn remove(&self, id: Uuid) -> StoreResult<()> {
        if self.fault == Fault::Remove {
            return Err(outage());
        }
        PipelineFactory::remove(self.inner.as_ref(), id).await
    }

    async fn sync(&self, pipeline: &Pipeline) -> StoreResult<Vec<Job>> {
        if self.fault == Fault::Sync {
            return Err(outage());
        }
        self.inner.sync(pipeline).await
    }
}

/// Job and build factory whose every call fails
pub struct BrokenStore;

#[async_trait]
impl JobFactory for BrokenStore {
    async fn get(&self, _id: Uuid) -> StoreResult<Option<Job>> {
        Err(outage())
    }

    async fn list(&self, _options: ListOptions) -> StoreResult<Vec<Job>> {
        Err(outage())
    }

    async fn list_by_pipeline(&self, _pipeline_id: Uuid, _query: JobQuery) -> StoreResult<Vec<Job>> {
        Err(outage())
    }
}

#[async_trait]
impl BuildFactory for BrokenStore {
    async fn get(&self, _id: Uuid) -> StoreResult<Option<Build>> {
        Err(outage())
    }

    async fn create(&self, _new: NewBuild) -> StoreResult<Build> {
        Err(outage())
    }

    async fn list_by_job(&self, _job_id: Uuid, _paginate: Paginate) -> StoreResult<Vec<Build>> {
        Err(outage())
    }
}
