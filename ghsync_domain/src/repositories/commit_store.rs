// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for file-grained `Commit` rows.

use async_trait::async_trait;

use crate::entities::commit::Commit;
use crate::error::IngestError;
use crate::value_objects::local_id::RepositoryId;

#[async_trait]
pub trait CommitStore: Send + Sync {
    /// Upsert key: (sha, repository, filename).
    async fn upsert(&self, commit: &Commit) -> Result<(), IngestError>;

    async fn upsert_batch(&self, commits: &[Commit]) -> Result<(), IngestError>;

    /// `COUNT(DISTINCT sha)` for a repository: callers aggregating commit
    /// counts MUST `COUNT(DISTINCT sha)`, since one commit spans many rows.
    async fn distinct_commit_count(&self, repository_id: RepositoryId) -> Result<i64, IngestError>;

    /// `COUNT(DISTINCT sha)` across all repositories, for the Control API's
    /// entity counts operation.
    async fn distinct_commit_count_total(&self) -> Result<i64, IngestError>;

    async fn list_unenriched(&self, limit: i64) -> Result<Vec<Commit>, IngestError>;
}
