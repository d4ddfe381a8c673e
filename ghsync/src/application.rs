// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! The Pipeline Executor and the typed commands the Control API and
//! Scheduler issue to it. Stage Processors and Store ports (the domain
//! contracts) are wired together here into runnable pipelines; no HTTP or
//! CLI concerns live in this layer.

pub mod commands;
pub mod enrichment_stage;
pub mod executor;
pub mod fetch_stage;
pub mod ingest_stage;
pub mod ranking_stage;
pub mod scheduler;
pub mod sitemap_indexer;

pub use commands::{ErrorPolicy, PipelineContext, ScheduleCommand, TriggerCommand};
pub use enrichment_stage::{ContributorEnrichmentStage, RepositoryEnrichmentStage};
pub use executor::{PipelineExecutor, PipelineStage, RunSummary};
pub use fetch_stage::{CommitFetchStage, PullRequestFetchStage, RepositoryFetchStage};
pub use ingest_stage::{
    CommitIngestStage, CommitPayload, ContributorIngestStage, ContributorSighting, PullRequestIngestStage, PullRequestPayload,
    RepositoryIngestStage,
};
pub use ranking_stage::{ContributorAggregationStage, RankingStage};
pub use scheduler::{Scheduler, TickResult};
pub use sitemap_indexer::SitemapIndexer;
