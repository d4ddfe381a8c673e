// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store ports for the analytics tables: `ContributorRepository` (junction)
//! and `ContributorRanking` (Ranking processor).

use async_trait::async_trait;

use crate::entities::contributor_ranking::ContributorRanking;
use crate::entities::contributor_repository::ContributorRepository;
use crate::error::IngestError;
use crate::value_objects::local_id::ContributorId;

#[async_trait]
pub trait ContributorRepositoryStore: Send + Sync {
    async fn upsert(&self, junction: &ContributorRepository) -> Result<(), IngestError>;

    async fn list_for_contributor(&self, contributor_id: ContributorId) -> Result<Vec<ContributorRepository>, IngestError>;

    /// Recomputes every (contributor, repository) junction row from the
    /// `commits` and `merge_requests` tables. Idempotent.
    async fn recompute_all(&self) -> Result<(), IngestError>;
}

#[async_trait]
pub trait ContributorRankingStore: Send + Sync {
    /// Ranking rows are append-only — a new row is inserted per run, never
    /// updated in place, so that historical rows are retained for trend
    /// analysis.
    async fn insert_snapshot(&self, ranking: &ContributorRanking) -> Result<(), IngestError>;

    async fn latest_for_contributor(&self, contributor_id: ContributorId) -> Result<Option<ContributorRanking>, IngestError>;

    async fn latest_leaderboard(&self, limit: i64) -> Result<Vec<ContributorRanking>, IngestError>;
}
