// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for the `Repository` entity.

use async_trait::async_trait;

use crate::entities::repository::Repository;
use crate::error::IngestError;
use crate::value_objects::local_id::RepositoryId;

#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Idempotent upsert keyed on `upstream_id`. Never overwrites a
    /// non-null field with null unless `allow_null_overwrite` is set.
    async fn upsert(&self, repository: &Repository, allow_null_overwrite: bool) -> Result<RepositoryId, IngestError>;

    async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Repository>, IngestError>;

    async fn get_by_id(&self, id: RepositoryId) -> Result<Option<Repository>, IngestError>;

    async fn get_by_full_name(&self, full_name: &str) -> Result<Option<Repository>, IngestError>;

    /// Repositories with `is_enriched = false` and `enrichment_attempts <
    /// max_attempts`, oldest first (Enrichment processor input).
    async fn list_unenriched(&self, max_attempts: i32, limit: i64) -> Result<Vec<Repository>, IngestError>;

    /// Page of repositories ordered by local id, for the Sitemap Indexer.
    async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<Repository>, IngestError>;

    async fn count(&self) -> Result<i64, IngestError>;

    /// Resets `enrichment_attempts` to 0, per the Control API's `reset`
    /// operation.
    async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError>;
}
