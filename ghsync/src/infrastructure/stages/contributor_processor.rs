// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Contributor processor: resolves an upstream actor (a GitHub user
//! seen as a PR author, committer, or repository owner) to a local
//! `ContributorId`, inserting a placeholder row when only a numeric id is
//! known and promoting it in place once a real login surfaces.

use std::sync::Arc;

use ghsync_domain::entities::contributor::Contributor;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::contributor_store::ContributorStore;
use ghsync_domain::value_objects::local_id::ContributorId;

use crate::infrastructure::stages::StageOutcome;

pub struct ContributorProcessor {
    store: Arc<dyn ContributorStore>,
}

impl ContributorProcessor {
    pub fn new(store: Arc<dyn ContributorStore>) -> Self {
        Self { store }
    }

    /// Resolution order: (1) known upstream id with a login →
    /// create or enrich a real contributor; (2) known upstream id, no login
    /// → placeholder; (3) already present → promote without clobbering
    /// fields already populated by a previous enrichment pass.
    pub async fn resolve_or_create(&self, upstream_id: i64, login: Option<&str>) -> Result<ContributorId, IngestError> {
        let contributor = match self.store.get_by_upstream_id(upstream_id).await? {
            Some(mut existing) => {
                if let Some(login) = login {
                    if existing.username.is_none() || existing.is_placeholder {
                        existing.apply_enrichment(Some(login.to_string()), None, None);
                    }
                }
                existing
            }
            None => Contributor::new_minimal(upstream_id, login.map(str::to_string), login.is_none()),
        };

        self.store.upsert(&contributor, false).await
    }

    /// Batch form used by the Executor when resolving every actor surfaced
    /// in one run's raw payloads; never fails the whole batch for one bad
    /// identity.
    pub async fn resolve_batch(&self, actors: &[(i64, Option<String>)]) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        for (upstream_id, login) in actors {
            match self.resolve_or_create(*upstream_id, login.as_deref()).await {
                Ok(_) => outcome.processed += 1,
                Err(e) => outcome.record_error(e.to_string()),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<HashMap<i64, Contributor>>,
    }

    #[async_trait]
    impl ContributorStore for FakeStore {
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
            Ok(self.rows.lock().values().cloned().collect())
        }

        async fn list_with_contributions(&self) -> Result<Vec<Contributor>, IngestError> {
            Ok(Vec::new())
        }

        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }

        async fn merge_duplicate(&self, canonical_id: ContributorId, duplicate_id: ContributorId) -> Result<(), IngestError> {
            let mut rows = self.rows.lock();
            rows.retain(|_, c| c.id != duplicate_id);
            let _ = canonical_id;
            Ok(())
        }

        async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
            Ok(0)
        }

        async fn recompute_aggregates(&self) -> Result<(), IngestError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn placeholder_created_without_login() {
        let processor = ContributorProcessor::new(Arc::new(FakeStore::default()));
        let id = processor.resolve_or_create(42, None).await.unwrap();
        let found = processor.store.get_by_id(id).await.unwrap().unwrap();
        assert!(found.is_placeholder);
        assert!(found.username.is_none());
    }

    #[tokio::test]
    async fn second_sighting_with_login_promotes_placeholder_in_place() {
        let processor = ContributorProcessor::new(Arc::new(FakeStore::default()));
        let first = processor.resolve_or_create(42, None).await.unwrap();
        let second = processor.resolve_or_create(42, Some("octocat")).await.unwrap();

        assert_eq!(first, second);
        let found = processor.store.get_by_id(first).await.unwrap().unwrap();
        assert!(!found.is_placeholder);
        assert_eq!(found.username.as_deref(), Some("octocat"));
    }

    #[tokio::test]
    async fn batch_resolution_reports_partial_failure_independently() {
        let processor = ContributorProcessor::new(Arc::new(FakeStore::default()));
        let actors = vec![(1, Some("a".to_string())), (2, None)];
        let outcome = processor.resolve_batch(&actors).await;
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.failed, 0);
    }
}
