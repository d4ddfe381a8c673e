// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for the `Contributor` entity.

use async_trait::async_trait;

use crate::entities::contributor::Contributor;
use crate::error::IngestError;
use crate::value_objects::local_id::ContributorId;

#[async_trait]
pub trait ContributorStore: Send + Sync {
    async fn upsert(&self, contributor: &Contributor, allow_null_overwrite: bool) -> Result<ContributorId, IngestError>;

    async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Contributor>, IngestError>;

    async fn get_by_id(&self, id: ContributorId) -> Result<Option<Contributor>, IngestError>;

    async fn list_unenriched(&self, max_attempts: i32, limit: i64) -> Result<Vec<Contributor>, IngestError>;

    async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<Contributor>, IngestError>;

    /// All contributors with at least one contribution, for the Ranking
    /// processor.
    async fn list_with_contributions(&self) -> Result<Vec<Contributor>, IngestError>;

    async fn count(&self) -> Result<i64, IngestError>;

    /// Identity merge (Contributor processor): repoints every FK
    /// referencing `duplicate_id` to `canonical_id` and removes the
    /// duplicate row, in one transaction.
    async fn merge_duplicate(&self, canonical_id: ContributorId, duplicate_id: ContributorId) -> Result<(), IngestError>;

    async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError>;

    /// Recomputes `commit_count`, `merged_pr_count`, `rejected_pr_count`,
    /// `review_count`, and the contribution window from the `commits` and
    /// `merge_requests` tables. Idempotent; the Ranking processor (and
    /// `list_with_contributions`) depend on these being current, so this
    /// runs after every ingest pass rather than being folded incrementally.
    async fn recompute_aggregates(&self) -> Result<(), IngestError>;
}
