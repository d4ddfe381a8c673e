// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Commit processor: splits one `UpstreamCommit` plus its changed-file
//! list into N `Commit` rows (a commit SHA may correspond to N rows, one
//! per changed file"), resolving the author and truncating oversized patches
//! in the same pass.

use std::sync::Arc;

use ghsync_domain::entities::commit::{Commit, FileStatus};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::commit_store::CommitStore;
use ghsync_domain::services::github_client::{UpstreamCommit, UpstreamCommitFile};
use ghsync_domain::value_objects::local_id::{CommitId, MergeRequestId, RepositoryId};

use crate::infrastructure::stages::contributor_processor::ContributorProcessor;

pub struct CommitProcessor {
    store: Arc<dyn CommitStore>,
    contributors: Arc<ContributorProcessor>,
}

impl CommitProcessor {
    pub fn new(store: Arc<dyn CommitStore>, contributors: Arc<ContributorProcessor>) -> Self {
        Self { store, contributors }
    }

    pub async fn process(
        &self,
        repository_id: RepositoryId,
        repository_upstream_id: i64,
        merge_request: Option<(MergeRequestId, i64)>,
        commit: UpstreamCommit,
        files: Vec<UpstreamCommitFile>,
    ) -> Result<(), IngestError> {
        let contributor_id = match commit.author_upstream_id {
            Some(upstream_id) => Some(self.contributors.resolve_or_create(upstream_id, None).await?),
            None => None,
        };

        let is_merge_commit = Commit::is_merge(commit.parent_shas.len());
        let rows: Vec<Commit> = if files.is_empty() {
            vec![self.build_row(
                CommitId::new(),
                repository_id,
                repository_upstream_id,
                contributor_id,
                commit.author_upstream_id,
                &merge_request,
                &commit,
                is_merge_commit,
                None,
            )]
        } else {
            files
                .into_iter()
                .map(|file| {
                    self.build_row(
                        CommitId::new(),
                        repository_id,
                        repository_upstream_id,
                        contributor_id,
                        commit.author_upstream_id,
                        &merge_request,
                        &commit,
                        is_merge_commit,
                        Some(file),
                    )
                })
                .collect()
        };

        self.store.upsert_batch(&rows).await
    }

    #[allow(clippy::too_many_arguments)]
    fn build_row(
        &self,
        id: CommitId,
        repository_id: RepositoryId,
        repository_upstream_id: i64,
        contributor_id: Option<ghsync_domain::value_objects::local_id::ContributorId>,
        contributor_upstream_id: Option<i64>,
        merge_request: &Option<(MergeRequestId, i64)>,
        commit: &UpstreamCommit,
        is_merge_commit: bool,
        file: Option<UpstreamCommitFile>,
    ) -> Commit {
        let (filename, file_status, additions, deletions, patch) = match file {
            Some(f) => (
                f.filename,
                FileStatus::from_upstream(&f.status).unwrap_or(FileStatus::Modified),
                f.additions,
                f.deletions,
                f.patch.and_then(Commit::truncate_patch),
            ),
            None => (String::new(), FileStatus::Modified, 0, 0, None),
        };

        Commit {
            id,
            sha: commit.sha.clone(),
            repository_id,
            repository_upstream_id,
            contributor_id,
            contributor_upstream_id,
            merge_request_id: merge_request.map(|(id, _)| id),
            merge_request_upstream_id: merge_request.map(|(_, number)| number),
            message: commit.message.clone(),
            committed_at: commit.committed_at,
            parent_shas: commit.parent_shas.clone(),
            filename,
            file_status,
            additions,
            deletions,
            patch,
            complexity_score: ((additions + deletions + 1) as f64).ln(),
            is_merge_commit,
            is_enriched: false,
        }
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
    struct FakeCommitStore {
        rows: Mutex<Vec<Commit>>,
    }

    #[async_trait]
    impl CommitStore for FakeCommitStore {
        async fn upsert(&self, commit: &Commit) -> Result<(), IngestError> {
            self.rows.lock().push(commit.clone());
            Ok(())
        }
        async fn upsert_batch(&self, commits: &[Commit]) -> Result<(), IngestError> {
            self.rows.lock().extend(commits.iter().cloned());
            Ok(())
        }
        async fn distinct_commit_count(&self, _repository_id: RepositoryId) -> Result<i64, IngestError> {
            let rows = self.rows.lock();
            let mut shas: Vec<&String> = rows.iter().map(|c| &c.sha).collect();
            shas.sort();
            shas.dedup();
            Ok(shas.len() as i64)
        }
        async fn distinct_commit_count_total(&self) -> Result<i64, IngestError> {
            let rows = self.rows.lock();
            let mut shas: Vec<&String> = rows.iter().map(|c| &c.sha).collect();
            shas.sort();
            shas.dedup();
            Ok(shas.len() as i64)
        }
        async fn list_unenriched(&self, _limit: i64) -> Result<Vec<Commit>, IngestError> {
            Ok(Vec::new())
        }
    }

    fn sample_commit(sha: &str, parents: usize) -> UpstreamCommit {
        UpstreamCommit {
            sha: sha.to_string(),
            message: "fix bug".to_string(),
            committed_at: Utc::now(),
            author_upstream_id: Some(7),
            parent_shas: (0..parents).map(|i| format!("p{i}")).collect(),
        }
    }

    #[tokio::test]
    async fn commit_with_three_changed_files_produces_three_rows() {
        let contributors = Arc::new(ContributorProcessor::new(Arc::new(FakeContributorStore::default())));
        let store: Arc<dyn CommitStore> = Arc::new(FakeCommitStore::default());
        let processor = CommitProcessor::new(store.clone(), contributors);

        let files = vec![
            UpstreamCommitFile { filename: "a.rs".into(), status: "modified".into(), additions: 1, deletions: 0, patch: None },
            UpstreamCommitFile { filename: "b.rs".into(), status: "added".into(), additions: 10, deletions: 0, patch: None },
            UpstreamCommitFile { filename: "c.rs".into(), status: "removed".into(), additions: 0, deletions: 5, patch: None },
        ];

        processor
            .process(RepositoryId::new(), 100, None, sample_commit("abc", 1), files)
            .await
            .unwrap();

        assert_eq!(processor.store.distinct_commit_count(RepositoryId::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn two_parents_marks_merge_commit() {
        let contributors = Arc::new(ContributorProcessor::new(Arc::new(FakeContributorStore::default())));
        let concrete = Arc::new(FakeCommitStore::default());
        let processor = CommitProcessor::new(concrete.clone(), contributors);

        processor
            .process(RepositoryId::new(), 100, None, sample_commit("merge1", 2), vec![])
            .await
            .unwrap();

        let rows = concrete.rows.lock();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_merge_commit);
    }
}
