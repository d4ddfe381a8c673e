// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Merge request processor: maps an `UpstreamPullRequest` onto the
//! local `MergeRequest` row, deriving `state`, `cycle_time_hours`, and
//! `complexity_score` from the raw fields rather than trusting any upstream
//! equivalent, since GitHub does not expose these directly.

use std::sync::Arc;

use ghsync_domain::entities::merge_request::{MergeRequest, MergeRequestState};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::merge_request_store::MergeRequestStore;
use ghsync_domain::services::github_client::UpstreamPullRequest;
use ghsync_domain::value_objects::local_id::{MergeRequestId, RepositoryId};

use crate::infrastructure::stages::contributor_processor::ContributorProcessor;

pub struct MergeRequestProcessor {
    store: Arc<dyn MergeRequestStore>,
    contributors: Arc<ContributorProcessor>,
}

impl MergeRequestProcessor {
    pub fn new(store: Arc<dyn MergeRequestStore>, contributors: Arc<ContributorProcessor>) -> Self {
        Self { store, contributors }
    }

    pub async fn process(
        &self,
        repository_id: RepositoryId,
        repository_upstream_id: i64,
        upstream: UpstreamPullRequest,
    ) -> Result<MergeRequestId, IngestError> {
        let author_upstream_id = upstream.author_upstream_id.unwrap_or(-1);
        let author_id = self
            .contributors
            .resolve_or_create(author_upstream_id, upstream.author_login.as_deref())
            .await?;

        let existing = self
            .store
            .get_by_repository_and_number(repository_upstream_id, upstream.number)
            .await?;

        let state = MergeRequestState::from_upstream(&upstream.state, upstream.merged);
        let cycle_time_hours = MergeRequest::cycle_time_hours(upstream.created_at, upstream.merged_at);
        let (commit_count, additions, deletions, changed_files, review_count, comment_count) = existing
            .as_ref()
            .map(|e| {
                (
                    e.commit_count,
                    e.additions,
                    e.deletions,
                    e.changed_files,
                    e.review_count,
                    e.comment_count,
                )
            })
            .unwrap_or((0, 0, 0, 0, 0, 0));
        let complexity_score = MergeRequest::complexity_score(changed_files, additions, deletions);

        let merge_request = MergeRequest {
            id: existing.as_ref().map(|e| e.id).unwrap_or_else(MergeRequestId::new),
            upstream_number: upstream.number,
            repository_id,
            repository_upstream_id,
            author_id,
            author_upstream_id,
            title: upstream.title,
            description: upstream.body,
            state,
            is_draft: upstream.draft,
            created_at: upstream.created_at,
            updated_at: upstream.updated_at,
            closed_at: upstream.closed_at,
            merged_at: upstream.merged_at,
            merger_id: existing.as_ref().and_then(|e| e.merger_id),
            commit_count,
            additions,
            deletions,
            changed_files,
            review_count,
            comment_count,
            complexity_score,
            review_time_hours: existing.as_ref().and_then(|e| e.review_time_hours),
            cycle_time_hours,
            labels: upstream.labels,
            source_branch: upstream.source_branch,
            target_branch: upstream.target_branch,
            is_enriched: existing.as_ref().map(|e| e.is_enriched).unwrap_or(false),
        };

        self.store.upsert(&merge_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
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
    struct FakeMergeRequestStore {
        rows: Mutex<HashMap<(i64, i64), MergeRequest>>,
    }

    #[async_trait]
    impl MergeRequestStore for FakeMergeRequestStore {
        async fn upsert(&self, merge_request: &MergeRequest) -> Result<MergeRequestId, IngestError> {
            let key = (merge_request.repository_upstream_id, merge_request.upstream_number);
            let mut rows = self.rows.lock();
            let id = rows.get(&key).map(|m| m.id).unwrap_or(merge_request.id);
            let mut stored = merge_request.clone();
            stored.id = id;
            rows.insert(key, stored);
            Ok(id)
        }
        async fn get_by_repository_and_number(
            &self,
            repository_upstream_id: i64,
            number: i64,
        ) -> Result<Option<MergeRequest>, IngestError> {
            Ok(self.rows.lock().get(&(repository_upstream_id, number)).cloned())
        }
        async fn list_unenriched(&self, _limit: i64) -> Result<Vec<MergeRequest>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<MergeRequest>, IngestError> {
            Ok(self.rows.lock().values().cloned().collect())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }
    }

    fn sample(number: i64, merged: bool) -> UpstreamPullRequest {
        let created = Utc::now();
        UpstreamPullRequest {
            number,
            title: "Add feature".to_string(),
            body: None,
            state: if merged { "closed".to_string() } else { "open".to_string() },
            merged,
            draft: false,
            author_upstream_id: Some(7),
            author_login: Some("bob".to_string()),
            created_at: created,
            updated_at: created,
            closed_at: None,
            merged_at: if merged { Some(created) } else { None },
            labels: vec!["bug".to_string()],
            source_branch: Some("feature".to_string()),
            target_branch: Some("main".to_string()),
        }
    }

    #[tokio::test]
    async fn merged_pr_derives_merged_state_and_cycle_time() {
        let contributors = Arc::new(ContributorProcessor::new(Arc::new(FakeContributorStore::default())));
        let store: Arc<dyn MergeRequestStore> = Arc::new(FakeMergeRequestStore::default());
        let processor = MergeRequestProcessor::new(store.clone(), contributors);

        let id = processor.process(RepositoryId::new(), 100, sample(1, true)).await.unwrap();
        let found = store.get_by_repository_and_number(100, 1).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.state, MergeRequestState::Merged);
        assert_eq!(found.cycle_time_hours, Some(0.0));
    }

    #[tokio::test]
    async fn reprocessing_preserves_enrichment_derived_fields() {
        let contributors = Arc::new(ContributorProcessor::new(Arc::new(FakeContributorStore::default())));
        let store: Arc<dyn MergeRequestStore> = Arc::new(FakeMergeRequestStore::default());
        let processor = MergeRequestProcessor::new(store.clone(), contributors);

        let id = processor.process(RepositoryId::new(), 100, sample(5, false)).await.unwrap();
        let mut enriched = store.get_by_repository_and_number(100, 5).await.unwrap().unwrap();
        enriched.is_enriched = true;
        enriched.additions = 500;
        store.upsert(&enriched).await.unwrap();

        let second = processor.process(RepositoryId::new(), 100, sample(5, false)).await.unwrap();
        let found = store.get_by_repository_and_number(100, 5).await.unwrap().unwrap();
        assert_eq!(second, id);
        assert!(found.is_enriched);
        assert_eq!(found.additions, 500);
    }
}
