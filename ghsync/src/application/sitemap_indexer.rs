// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Sitemap Indexer: advances the per-entity-type `SitemapMetadata` cursor by
//! one page at a time. Emits no XML itself — it only maintains the metadata
//! an out-of-scope HTTP layer reads to serve the sitemap.

use std::sync::Arc;

use chrono::Utc;

use ghsync_domain::entities::sitemap_metadata::{IndexableEntityType, SitemapMetadata};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::contributor_store::ContributorStore;
use ghsync_domain::repositories::merge_request_store::MergeRequestStore;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use ghsync_domain::repositories::sitemap_store::SitemapStore;

const PAGE_SIZE: i64 = 500;

pub struct SitemapIndexer {
    repositories: Arc<dyn RepositoryStore>,
    contributors: Arc<dyn ContributorStore>,
    merge_requests: Arc<dyn MergeRequestStore>,
    sitemap: Arc<dyn SitemapStore>,
}

impl SitemapIndexer {
    pub fn new(
        repositories: Arc<dyn RepositoryStore>,
        contributors: Arc<dyn ContributorStore>,
        merge_requests: Arc<dyn MergeRequestStore>,
        sitemap: Arc<dyn SitemapStore>,
    ) -> Self {
        Self {
            repositories,
            contributors,
            merge_requests,
            sitemap,
        }
    }

    /// Advances every entity type's cursor by one page; restarts an entity
    /// type at page 0 once its page comes back empty, so a full index cycle
    /// eventually sweeps the whole table again as new rows accrue.
    pub async fn run(&self) -> Result<(), IngestError> {
        self.advance_repositories().await?;
        self.advance_contributors().await?;
        self.advance_merge_requests().await?;
        Ok(())
    }

    async fn advance_repositories(&self) -> Result<(), IngestError> {
        let mut metadata = self
            .sitemap
            .get(IndexableEntityType::Repository)
            .await?
            .unwrap_or_else(|| SitemapMetadata::new(IndexableEntityType::Repository));

        let page = self.repositories.list_page(metadata.current_page, PAGE_SIZE).await?;
        self.advance(&mut metadata, page.len() as i64).await
    }

    async fn advance_contributors(&self) -> Result<(), IngestError> {
        let mut metadata = self
            .sitemap
            .get(IndexableEntityType::Contributor)
            .await?
            .unwrap_or_else(|| SitemapMetadata::new(IndexableEntityType::Contributor));

        let page = self.contributors.list_page(metadata.current_page, PAGE_SIZE).await?;
        self.advance(&mut metadata, page.len() as i64).await
    }

    async fn advance_merge_requests(&self) -> Result<(), IngestError> {
        let mut metadata = self
            .sitemap
            .get(IndexableEntityType::MergeRequest)
            .await?
            .unwrap_or_else(|| SitemapMetadata::new(IndexableEntityType::MergeRequest));

        let page = self.merge_requests.list_page(metadata.current_page, PAGE_SIZE).await?;
        self.advance(&mut metadata, page.len() as i64).await
    }

    async fn advance(&self, metadata: &mut SitemapMetadata, page_len: i64) -> Result<(), IngestError> {
        if page_len == 0 {
            metadata.current_page = 0;
        } else {
            metadata.current_page += 1;
            metadata.url_count += page_len;
        }
        metadata.last_updated_at = Utc::now();
        self.sitemap.upsert(metadata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ghsync_domain::entities::contributor::Contributor;
    use ghsync_domain::entities::merge_request::MergeRequest;
    use ghsync_domain::entities::repository::Repository;
    use ghsync_domain::value_objects::local_id::{ContributorId, MergeRequestId, RepositoryId};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeRepositoryStore {
        rows: Vec<Repository>,
    }

    #[async_trait]
    impl RepositoryStore for FakeRepositoryStore {
        async fn upsert(&self, _repository: &Repository, _allow_null_overwrite: bool) -> Result<RepositoryId, IngestError> {
            unimplemented!()
        }
        async fn get_by_upstream_id(&self, _upstream_id: i64) -> Result<Option<Repository>, IngestError> {
            Ok(None)
        }
        async fn get_by_id(&self, _id: RepositoryId) -> Result<Option<Repository>, IngestError> {
            Ok(None)
        }
        async fn get_by_full_name(&self, _full_name: &str) -> Result<Option<Repository>, IngestError> {
            Ok(None)
        }
        async fn list_unenriched(&self, _max_attempts: i32, _limit: i64) -> Result<Vec<Repository>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<Repository>, IngestError> {
            let start = (page * page_size) as usize;
            Ok(self.rows.iter().skip(start).take(page_size as usize).cloned().collect())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.len() as i64)
        }
        async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct EmptyContributorStore;

    #[async_trait]
    impl ContributorStore for EmptyContributorStore {
        async fn upsert(&self, _contributor: &Contributor, _allow_null_overwrite: bool) -> Result<ContributorId, IngestError> {
            unimplemented!()
        }
        async fn get_by_upstream_id(&self, _upstream_id: i64) -> Result<Option<Contributor>, IngestError> {
            Ok(None)
        }
        async fn get_by_id(&self, _id: ContributorId) -> Result<Option<Contributor>, IngestError> {
            Ok(None)
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
            Ok(0)
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
    struct EmptyMergeRequestStore;

    #[async_trait]
    impl MergeRequestStore for EmptyMergeRequestStore {
        async fn upsert(&self, _merge_request: &MergeRequest) -> Result<MergeRequestId, IngestError> {
            unimplemented!()
        }
        async fn get_by_repository_and_number(&self, _repository_upstream_id: i64, _number: i64) -> Result<Option<MergeRequest>, IngestError> {
            Ok(None)
        }
        async fn list_unenriched(&self, _limit: i64) -> Result<Vec<MergeRequest>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<MergeRequest>, IngestError> {
            Ok(Vec::new())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct FakeSitemapStore {
        rows: Mutex<HashMap<IndexableEntityType, SitemapMetadata>>,
    }

    #[async_trait]
    impl SitemapStore for FakeSitemapStore {
        async fn get(&self, entity_type: IndexableEntityType) -> Result<Option<SitemapMetadata>, IngestError> {
            Ok(self.rows.lock().get(&entity_type).cloned())
        }
        async fn upsert(&self, metadata: &SitemapMetadata) -> Result<(), IngestError> {
            self.rows.lock().insert(metadata.entity_type, metadata.clone());
            Ok(())
        }
    }

    fn sample_repo(id: i64) -> Repository {
        Repository::new_minimal(id, format!("acme/repo{id}"), 0)
    }

    #[tokio::test]
    async fn advances_one_page_per_run_and_accumulates_url_count() {
        let repositories = Arc::new(FakeRepositoryStore {
            rows: (0..1200).map(sample_repo).collect(),
        });
        let sitemap = Arc::new(FakeSitemapStore::default());
        let indexer = SitemapIndexer::new(
            repositories,
            Arc::new(EmptyContributorStore),
            Arc::new(EmptyMergeRequestStore),
            sitemap.clone(),
        );

        indexer.run().await.unwrap();
        let first = sitemap.get(IndexableEntityType::Repository).await.unwrap().unwrap();
        assert_eq!(first.current_page, 1);
        assert_eq!(first.url_count, PAGE_SIZE);

        indexer.run().await.unwrap();
        let second = sitemap.get(IndexableEntityType::Repository).await.unwrap().unwrap();
        assert_eq!(second.current_page, 2);
        assert_eq!(second.url_count, PAGE_SIZE * 2);
    }

    #[tokio::test]
    async fn empty_page_resets_cursor_to_the_start() {
        let repositories = Arc::new(FakeRepositoryStore { rows: Vec::new() });
        let sitemap = Arc::new(FakeSitemapStore::default());
        let indexer = SitemapIndexer::new(
            repositories,
            Arc::new(EmptyContributorStore),
            Arc::new(EmptyMergeRequestStore),
            sitemap.clone(),
        );

        indexer.run().await.unwrap();
        let metadata = sitemap.get(IndexableEntityType::Repository).await.unwrap().unwrap();
        assert_eq!(metadata.current_page, 0);
        assert_eq!(metadata.url_count, 0);
    }
}
