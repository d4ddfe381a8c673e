// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for the `MergeRequest` entity.

use async_trait::async_trait;

use crate::entities::merge_request::MergeRequest;
use crate::error::IngestError;
use crate::value_objects::local_id::MergeRequestId;

#[async_trait]
pub trait MergeRequestStore: Send + Sync {
    /// Upsert key: (repository upstream id, PR number).
    async fn upsert(&self, merge_request: &MergeRequest) -> Result<MergeRequestId, IngestError>;

    async fn get_by_repository_and_number(
        &self,
        repository_upstream_id: i64,
        number: i64,
    ) -> Result<Option<MergeRequest>, IngestError>;

    async fn list_unenriched(&self, limit: i64) -> Result<Vec<MergeRequest>, IngestError>;

    async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<MergeRequest>, IngestError>;

    async fn count(&self) -> Result<i64, IngestError>;
}
