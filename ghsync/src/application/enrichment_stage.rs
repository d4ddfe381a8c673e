// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Thin `PipelineStage` wrappers around the Enrichment processor, which is a
//! plain struct (no DAG awareness of its own) so it can be unit tested and
//! reused outside a pipeline run, e.g. from the `ResetEnrichment` CLI path.

use std::sync::Arc;

use async_trait::async_trait;

use ghsync_domain::error::IngestError;

use crate::application::commands::PipelineContext;
use crate::application::executor::PipelineStage;
use crate::infrastructure::stages::{EnrichmentProcessor, StageOutcome};

const ENRICH_BATCH: i64 = 100;

pub struct RepositoryEnrichmentStage {
    processor: Arc<EnrichmentProcessor>,
}

impl RepositoryEnrichmentStage {
    pub fn new(processor: Arc<EnrichmentProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl PipelineStage for RepositoryEnrichmentStage {
    fn name(&self) -> &str {
        "enrich_repositories"
    }

    fn depends_on(&self) -> &[&str] {
        &["ingest_repositories"]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        self.processor.enrich_repositories(ENRICH_BATCH, ctx).await
    }
}

pub struct ContributorEnrichmentStage {
    processor: Arc<EnrichmentProcessor>,
}

impl ContributorEnrichmentStage {
    pub fn new(processor: Arc<EnrichmentProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl PipelineStage for ContributorEnrichmentStage {
    fn name(&self) -> &str {
        "enrich_contributors"
    }

    fn depends_on(&self) -> &[&str] {
        &["ingest_contributor_sightings"]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        self.processor.enrich_contributors(ENRICH_BATCH, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ghsync_domain::entities::contributor::Contributor;
    use ghsync_domain::entities::repository::Repository;
    use ghsync_domain::repositories::contributor_store::ContributorStore;
    use ghsync_domain::repositories::repository_store::RepositoryStore;
    use ghsync_domain::services::github_client::{
        GithubClient, Page, PageCursor, UpstreamCommit, UpstreamCommitFile, UpstreamPullRequest, UpstreamRepository, UpstreamUser,
    };
    use ghsync_domain::value_objects::local_id::{ContributorId, RepositoryId};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeRepositoryStore {
        rows: Mutex<Vec<Repository>>,
    }

    #[async_trait]
    impl RepositoryStore for FakeRepositoryStore {
        async fn upsert(&self, repository: &Repository, _allow_null_overwrite: bool) -> Result<RepositoryId, IngestError> {
            let mut rows = self.rows.lock();
            if let Some(existing) = rows.iter_mut().find(|r| r.upstream_id == repository.upstream_id) {
                *existing = repository.clone();
            } else {
                rows.push(repository.clone());
            }
            Ok(repository.id)
        }
        async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Repository>, IngestError> {
            Ok(self.rows.lock().iter().find(|r| r.upstream_id == upstream_id).cloned())
        }
        async fn get_by_id(&self, id: RepositoryId) -> Result<Option<Repository>, IngestError> {
            Ok(self.rows.lock().iter().find(|r| r.id == id).cloned())
        }
        async fn get_by_full_name(&self, full_name: &str) -> Result<Option<Repository>, IngestError> {
            Ok(self.rows.lock().iter().find(|r| r.full_name == full_name).cloned())
        }
        async fn list_unenriched(&self, max_attempts: i32, limit: i64) -> Result<Vec<Repository>, IngestError> {
            Ok(self
                .rows
                .lock()
                .iter()
                .filter(|r| !r.is_enriched && r.enrichment_attempts < max_attempts)
                .take(limit as usize)
                .cloned()
                .collect())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<Repository>, IngestError> {
            Ok(self.rows.lock().clone())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }
        async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct FakeContributorStore {
        rows: Mutex<Vec<Contributor>>,
    }

    #[async_trait]
    impl ContributorStore for FakeContributorStore {
        async fn upsert(&self, contributor: &Contributor, _allow_null_overwrite: bool) -> Result<ContributorId, IngestError> {
            let mut rows = self.rows.lock();
            if let Some(existing) = rows.iter_mut().find(|c| c.upstream_id == contributor.upstream_id) {
                *existing = contributor.clone();
            } else {
                rows.push(contributor.clone());
            }
            Ok(contributor.id)
        }
        async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Contributor>, IngestError> {
            Ok(self.rows.lock().iter().find(|c| c.upstream_id == upstream_id).cloned())
        }
        async fn get_by_id(&self, id: ContributorId) -> Result<Option<Contributor>, IngestError> {
            Ok(self.rows.lock().iter().find(|c| c.id == id).cloned())
        }
        async fn list_unenriched(&self, max_attempts: i32, limit: i64) -> Result<Vec<Contributor>, IngestError> {
            Ok(self
                .rows
                .lock()
                .iter()
                .filter(|c| !c.is_enriched && c.enrichment_attempts < max_attempts)
                .take(limit as usize)
                .cloned()
                .collect())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<Contributor>, IngestError> {
            Ok(self.rows.lock().clone())
        }
        async fn list_with_contributions(&self) -> Result<Vec<Contributor>, IngestError> {
            Ok(Vec::new())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }
        async fn merge_duplicate(&self, _canonical_id: ContributorId, _duplicate_id: ContributorId) -> Result<(), IngestError> {
            Ok(())
        }
        async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
            Ok(0)
        }
        async fn recompute_aggregates(&self) -> Result<(), IngestError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeGithubClient;

    #[async_trait]
    impl GithubClient for FakeGithubClient {
        async fn get_repository(&self, owner: &str, name: &str) -> Result<UpstreamRepository, IngestError> {
            Ok(UpstreamRepository {
                upstream_id: 1,
                full_name: format!("{owner}/{name}"),
                description: Some("enriched".to_string()),
                url: None,
                stars: 0,
                forks: 0,
                watchers: 0,
                open_issues: 0,
                size: 0,
                language: Some("Rust".to_string()),
                license: None,
                default_branch: Some("main".to_string()),
                is_fork: false,
                is_archived: false,
                updated_at: Some(Utc::now()),
                owner_upstream_id: None,
                owner_login: None,
            })
        }
        async fn list_repository_pull_requests(&self, _owner: &str, _name: &str, _cursor: PageCursor) -> Result<Page<UpstreamPullRequest>, IngestError> {
            unimplemented!("not exercised by this test")
        }
        async fn get_pull_request(&self, _owner: &str, _name: &str, _number: i64) -> Result<UpstreamPullRequest, IngestError> {
            unimplemented!("not exercised by this test")
        }
        async fn list_pull_request_commits(&self, _owner: &str, _name: &str, _number: i64, _cursor: PageCursor) -> Result<Page<UpstreamCommit>, IngestError> {
            unimplemented!("not exercised by this test")
        }
        async fn list_commit_files(&self, _owner: &str, _name: &str, _sha: &str, _cursor: PageCursor) -> Result<Page<UpstreamCommitFile>, IngestError> {
            unimplemented!("not exercised by this test")
        }
        async fn get_user(&self, _login_or_id: &str) -> Result<UpstreamUser, IngestError> {
            unimplemented!("not exercised by this test")
        }
        async fn list_user_events(&self, _login: &str, _cursor: PageCursor) -> Result<Page<serde_json::Value>, IngestError> {
            unimplemented!("not exercised by this test")
        }
    }

    fn processor(repositories: Arc<dyn RepositoryStore>, contributors: Arc<dyn ContributorStore>) -> Arc<EnrichmentProcessor> {
        Arc::new(EnrichmentProcessor::new(repositories, contributors, Arc::new(FakeGithubClient), 3))
    }

    #[tokio::test]
    async fn repository_enrichment_stage_delegates_to_the_processor() {
        let repositories: Arc<dyn RepositoryStore> = Arc::new(FakeRepositoryStore::default());
        let repo = Repository::new_minimal(1, "octo/cat".to_string(), 0);
        repositories.upsert(&repo, false).await.unwrap();

        let stage = RepositoryEnrichmentStage::new(processor(repositories.clone(), Arc::new(FakeContributorStore::default())));
        assert_eq!(stage.name(), "enrich_repositories");
        assert_eq!(stage.depends_on(), &["ingest_repositories"]);

        let ctx = PipelineContext::new("run-1");
        let outcome = stage.run(&ctx).await.unwrap();
        assert_eq!(outcome.processed, 1);

        let enriched = repositories.get_by_full_name("octo/cat").await.unwrap().unwrap();
        assert!(enriched.is_enriched);
        assert_eq!(enriched.description.as_deref(), Some("enriched"));
    }

    #[tokio::test]
    async fn contributor_enrichment_stage_skips_logins_it_does_not_have() {
        let contributors: Arc<dyn ContributorStore> = Arc::new(FakeContributorStore::default());
        let placeholder = Contributor::new_minimal(42, None, true);
        contributors.upsert(&placeholder, false).await.unwrap();

        let stage = ContributorEnrichmentStage::new(processor(Arc::new(FakeRepositoryStore::default()), contributors));
        assert_eq!(stage.name(), "enrich_contributors");
        assert_eq!(stage.depends_on(), &["ingest_contributor_sightings"]);

        let ctx = PipelineContext::new("run-1");
        let outcome = stage.run(&ctx).await.unwrap();
        assert_eq!(outcome.skipped, 1);
    }
}
