// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Repository processor: maps an `UpstreamRepository` onto the local
//! `Repository` row, resolving the owner through the Contributor processor
//! first so the nullable owner foreign key is filled in whenever the
//! owner is already known.

use std::sync::Arc;

use ghsync_domain::entities::repository::Repository;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use ghsync_domain::services::github_client::UpstreamRepository;
use ghsync_domain::value_objects::local_id::RepositoryId;

use crate::infrastructure::stages::contributor_processor::ContributorProcessor;

pub struct RepositoryProcessor {
    store: Arc<dyn RepositoryStore>,
    contributors: Arc<ContributorProcessor>,
}

impl RepositoryProcessor {
    pub fn new(store: Arc<dyn RepositoryStore>, contributors: Arc<ContributorProcessor>) -> Self {
        Self { store, contributors }
    }

    pub async fn process(&self, upstream: UpstreamRepository) -> Result<RepositoryId, IngestError> {
        let owner_id = match upstream.owner_upstream_id {
            Some(owner_upstream_id) => Some(
                self.contributors
                    .resolve_or_create(owner_upstream_id, upstream.owner_login.as_deref())
                    .await?,
            ),
            None => None,
        };

        let existing = self.store.get_by_upstream_id(upstream.upstream_id).await?;
        let mut repository = existing.unwrap_or_else(|| Repository::new_minimal(upstream.upstream_id, upstream.full_name.clone(), upstream.stars));

        repository.full_name = upstream.full_name.clone();
        repository.display_name = upstream
            .full_name
            .rsplit('/')
            .next()
            .unwrap_or(&upstream.full_name)
            .to_string();
        repository.description = upstream.description;
        repository.url = upstream.url;
        repository.stars = upstream.stars;
        repository.forks = upstream.forks;
        repository.watcher_count = upstream.watchers;
        repository.open_issues_count = upstream.open_issues;
        repository.size = upstream.size;
        repository.primary_language = upstream.language;
        repository.license = upstream.license;
        repository.default_branch = upstream.default_branch;
        repository.is_fork = upstream.is_fork;
        repository.is_archived = upstream.is_archived;
        repository.last_updated_at = upstream.updated_at;
        repository.owner_id = owner_id.or(repository.owner_id);
        repository.owner_upstream_id = upstream.owner_upstream_id.or(repository.owner_upstream_id);

        self.store.upsert(&repository, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ghsync_domain::entities::contributor::Contributor;
    use ghsync_domain::repositories::contributor_store::ContributorStore;
    use ghsync_domain::value_objects::local_id::ContributorId;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeContributorStore {
        rows: Mutex<HashMap<i64, Contributor>>,
    }

    #[async_trait]
    impl ContributorStore for FakeContributorStore {
        async fn upsert(&self, contributor: &Contributor, _allow_null_overwrite: bool) -> Result<ContributorId, IngestError> {
            let mut rows = self.rows.lock();
            let id = rows.get(&contributor.upstream_id).map(|c| c.id).unwrap_or(contributor.id);
            let mut stored = contributor.clone();
            stored.id = id;
            rows.insert(contributor.upstream_id, stored);
            Ok(id)
        }
        async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Contributor>, IngestError> {
            Ok(self.rows.lock().get(&upstream_id).cloned())
        }
        async fn get_by_id(&self, id: ContributorId) -> Result<Option<Contributor>, IngestError> {
            Ok(self.rows.lock().values().find(|c| c.id == id).cloned())
        }
        async fn list_unenriched(&self, _max_attempts: i32, _limit: i64) -> Result<Vec<Contributor>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<Contributor>, IngestError> {
            Ok(Vec::new())
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
    struct FakeRepositoryStore {
        rows: Mutex<HashMap<i64, Repository>>,
    }

    #[async_trait]
    impl RepositoryStore for FakeRepositoryStore {
        async fn upsert(&self, repository: &Repository, _allow_null_overwrite: bool) -> Result<RepositoryId, IngestError> {
            let mut rows = self.rows.lock();
            let id = rows.get(&repository.upstream_id).map(|r| r.id).unwrap_or(repository.id);
            let mut stored = repository.clone();
            stored.id = id;
            rows.insert(repository.upstream_id, stored);
            Ok(id)
        }
        async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Repository>, IngestError> {
            Ok(self.rows.lock().get(&upstream_id).cloned())
        }
        async fn get_by_id(&self, id: RepositoryId) -> Result<Option<Repository>, IngestError> {
            Ok(self.rows.lock().values().find(|r| r.id == id).cloned())
        }
        async fn get_by_full_name(&self, full_name: &str) -> Result<Option<Repository>, IngestError> {
            Ok(self.rows.lock().values().find(|r| r.full_name == full_name).cloned())
        }
        async fn list_unenriched(&self, _max_attempts: i32, _limit: i64) -> Result<Vec<Repository>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<Repository>, IngestError> {
            Ok(self.rows.lock().values().cloned().collect())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }
        async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
            Ok(0)
        }
    }

    fn sample(upstream_id: i64, stars: i64) -> UpstreamRepository {
        UpstreamRepository {
            upstream_id,
            full_name: "acme/widget".to_string(),
            description: Some("a widget".to_string()),
            url: None,
            stars,
            forks: 1,
            watchers: 1,
            open_issues: 0,
            size: 10,
            language: Some("Rust".to_string()),
            license: Some("mit".to_string()),
            default_branch: Some("main".to_string()),
            is_fork: false,
            is_archived: false,
            updated_at: None,
            owner_upstream_id: Some(200),
            owner_login: Some("acme".to_string()),
        }
    }

    #[tokio::test]
    async fn first_sighting_creates_owner_placeholder_and_links_it() {
        let contributors = Arc::new(ContributorProcessor::new(Arc::new(FakeContributorStore::default())));
        let repositories: Arc<dyn RepositoryStore> = Arc::new(FakeRepositoryStore::default());
        let processor = RepositoryProcessor::new(repositories.clone(), contributors);

        let id = processor.process(sample(100, 42)).await.unwrap();
        let repo = repositories.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(repo.stars, 42);
        assert!(repo.owner_id.is_some());
        assert_eq!(repo.owner_upstream_id, Some(200));
    }

    #[tokio::test]
    async fn reprocessing_same_repository_is_idempotent() {
        let contributors = Arc::new(ContributorProcessor::new(Arc::new(FakeContributorStore::default())));
        let repositories: Arc<dyn RepositoryStore> = Arc::new(FakeRepositoryStore::default());
        let processor = RepositoryProcessor::new(repositories.clone(), contributors);

        let first = processor.process(sample(100, 42)).await.unwrap();
        let second = processor.process(sample(100, 99)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repositories.count().await.unwrap(), 1);
        assert_eq!(repositories.get_by_id(first).await.unwrap().unwrap().stars, 99);
    }
}
