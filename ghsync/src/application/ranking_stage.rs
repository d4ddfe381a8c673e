// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Thin `PipelineStage` wrappers closing out the analytics half of a run:
//! recompute the Contributor x Repository junction and each Contributor's
//! own denormalized counters from the ingested `commits`/`merge_requests`
//! tables, then score and snapshot the leaderboard.

use std::sync::Arc;

use async_trait::async_trait;

use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::analytics_store::ContributorRepositoryStore;
use ghsync_domain::repositories::contributor_store::ContributorStore;

use crate::application::commands::PipelineContext;
use crate::application::executor::PipelineStage;
use crate::infrastructure::stages::{RankingProcessor, StageOutcome};

/// Recomputes both the `ContributorRepository` junction and each
/// Contributor's own commit/PR/review counters. Both are pure aggregates
/// over `commits`/`merge_requests`, so this runs as one stage rather than
/// two competing recomputation passes.
pub struct ContributorAggregationStage {
    contributors: Arc<dyn ContributorStore>,
    contributor_repositories: Arc<dyn ContributorRepositoryStore>,
}

impl ContributorAggregationStage {
    pub fn new(contributors: Arc<dyn ContributorStore>, contributor_repositories: Arc<dyn ContributorRepositoryStore>) -> Self {
        Self {
            contributors,
            contributor_repositories,
        }
    }
}

#[async_trait]
impl PipelineStage for ContributorAggregationStage {
    fn name(&self) -> &str {
        "aggregate_contributions"
    }

    fn depends_on(&self) -> &[&str] {
        &["ingest_pull_requests", "ingest_commits"]
    }

    async fn run(&self, _ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        self.contributor_repositories.recompute_all().await?;
        self.contributors.recompute_aggregates().await?;
        Ok(StageOutcome::default())
    }
}

pub struct RankingStage {
    processor: Arc<RankingProcessor>,
}

impl RankingStage {
    pub fn new(processor: Arc<RankingProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl PipelineStage for RankingStage {
    fn name(&self) -> &str {
        "rank_contributors"
    }

    fn depends_on(&self) -> &[&str] {
        &["aggregate_contributions"]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        self.processor.run(ctx).await
    }
}
