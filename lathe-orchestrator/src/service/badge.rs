//! Badge Service
//!
//! Resolves the badge of a pipeline from the newest build of its first
//! active job. Resolution never fails: any absent entity or store error
//! yields [`Badge::unknown`].

use lathe_core::badge::Badge;
use lathe_core::dto::list::{JobQuery, Paginate};
use uuid::Uuid;

use crate::repository::{Factories, StoreResult};

/// Badge for a pipeline
pub async fn resolve_badge(factories: &Factories, pipeline_id: Uuid) -> Badge {
    match latest_status(factories, pipeline_id).await {
        Ok(Some(badge)) => badge,
        Ok(None) => Badge::unknown(),
        Err(err) => {
            tracing::warn!("Badge lookup for pipeline {} failed: {}", pipeline_id, err);
            Badge::unknown()
        }
    }
}

/// Each step yields `None` when there is nothing to look at
async fn latest_status(factories: &Factories, pipeline_id: Uuid) -> StoreResult<Option<Badge>> {
    let Some(pipeline) = factories.pipelines.get(pipeline_id).await? else {
        return Ok(None);
    };

    let jobs = factories
        .jobs
        .list_by_pipeline(pipeline.id, JobQuery::default())
        .await?;
    let Some(job) = jobs.first() else {
        return Ok(None);
    };

    let newest = Paginate { page: 1, count: 1 };
    let builds = factories.builds.list_by_job(job.id, newest).await?;

    Ok(builds.first().map(|build| Badge::for_status(&build.status)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{BrokenStore, Fault, FaultyPipelines, new_build, seeded};
    use lathe_core::badge::BadgeColor;
    use lathe_core::domain::build::BuildStatus;
    use std::sync::Arc;

    const TEMPLATE: &str = "{{status}}/{{color}}";

    #[tokio::test]
    async fn test_job_without_builds_is_unknown() {
        let fixture = seeded().await;

        let badge = resolve_badge(&fixture.factories, fixture.pipeline.id).await;

        assert_eq!(badge.render(TEMPLATE), "unknown/lightgrey");
    }

    #[tokio::test]
    async fn test_pipeline_without_jobs_is_unknown() {
        let fixture = seeded().await;
        fixture.store.archive_job(fixture.job.id).await;

        let badge = resolve_badge(&fixture.factories, fixture.pipeline.id).await;

        assert_eq!(badge, Badge::unknown());
    }

    #[tokio::test]
    async fn test_newest_build_decides() {
        let fixture = seeded().await;
        let builds = &fixture.factories.builds;
        let first = builds.create(new_build(fixture.job.id)).await.unwrap();
        let second = builds.create(new_build(fixture.job.id)).await.unwrap();
        fixture.store.set_build_status(first.id, BuildStatus::Success).await;
        fixture.store.set_build_status(second.id, BuildStatus::Failure).await;

        let badge = resolve_badge(&fixture.factories, fixture.pipeline.id).await;

        assert_eq!(badge.color, BadgeColor::Red);
        assert_eq!(badge.render(TEMPLATE), "failure/red");
    }

    #[tokio::test]
    async fn test_queued_build_is_blue() {
        let fixture = seeded().await;
        fixture
            .factories
            .builds
            .create(new_build(fixture.job.id))
            .await
            .unwrap();

        let badge = resolve_badge(&fixture.factories, fixture.pipeline.id).await;

        assert_eq!(badge.render(TEMPLATE), "queued/blue");
    }

    #[tokio::test]
    async fn test_missing_pipeline_is_unknown() {
        let fixture = seeded().await;

        let badge = resolve_badge(&fixture.factories, Uuid::new_v4()).await;

        assert_eq!(badge, Badge::unknown());
    }

    #[tokio::test]
    async fn test_store_failures_are_absorbed() {
        let fixture = seeded().await;
        fixture
            .factories
            .builds
            .create(new_build(fixture.job.id))
            .await
            .unwrap();

        let mut broken_pipelines = fixture.factories.clone();
        broken_pipelines.pipelines = Arc::new(FaultyPipelines {
            inner: fixture.store.clone(),
            fault: Fault::Get,
        });

        let mut broken_jobs = fixture.factories.clone();
        broken_jobs.jobs = Arc::new(BrokenStore);

        let mut broken_builds = fixture.factories.clone();
        broken_builds.builds = Arc::new(BrokenStore);

        for factories in [broken_pipelines, broken_jobs, broken_builds] {
            let badge = resolve_badge(&factories, fixture.pipeline.id).await;
            assert_eq!(badge, Badge::unknown());
        }
    }
}
