// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Bridges the durable Raw Buffer queue to the Stage Processors: each
//! `PipelineStage` impl here dequeues a batch of one payload kind, hands each
//! row's body to the matching processor, and marks the row processed on
//! success or releases it for retry on a recoverable failure. A fatal error
//! propagates to the Executor unreleased, leaving the row locked under its
//! run id until an operator intervenes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ghsync_domain::entities::raw_payload::RawPayloadKind;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::raw_buffer_store::RawBufferStore;
use ghsync_domain::services::github_client::{UpstreamCommit, UpstreamCommitFile, UpstreamPullRequest, UpstreamRepository};
use ghsync_domain::value_objects::local_id::{MergeRequestId, RepositoryId};
use std::sync::Arc;

use crate::application::commands::PipelineContext;
use crate::application::executor::PipelineStage;
use crate::infrastructure::stages::{CommitProcessor, ContributorProcessor, MergeRequestProcessor, RepositoryProcessor, StageOutcome};

const DEQUEUE_BATCH: i64 = 200;

/// Body shape enqueued for `RawPayloadKind::PullRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestPayload {
    pub repository_id: RepositoryId,
    pub repository_upstream_id: i64,
    pub pull_request: UpstreamPullRequest,
}

/// Body shape enqueued for `RawPayloadKind::Commit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitPayload {
    pub repository_id: RepositoryId,
    pub repository_upstream_id: i64,
    pub merge_request: Option<(MergeRequestId, i64)>,
    pub commit: UpstreamCommit,
    pub files: Vec<UpstreamCommitFile>,
}

/// Body shape enqueued for `RawPayloadKind::User` when an actor is seen
/// without a full enrichment round trip yet (e.g. a commit author sighting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorSighting {
    pub upstream_id: i64,
    pub login: Option<String>,
}

pub struct RepositoryIngestStage {
    buffer: Arc<dyn RawBufferStore>,
    processor: Arc<RepositoryProcessor>,
}

impl RepositoryIngestStage {
    pub fn new(buffer: Arc<dyn RawBufferStore>, processor: Arc<RepositoryProcessor>) -> Self {
        Self { buffer, processor }
    }
}

#[async_trait]
impl PipelineStage for RepositoryIngestStage {
    fn name(&self) -> &str {
        "ingest_repositories"
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let rows = self.buffer.dequeue(RawPayloadKind::Repository, DEQUEUE_BATCH, &ctx.run_id).await?;
        let mut outcome = StageOutcome::default();

        for row in rows {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let upstream: UpstreamRepository = match serde_json::from_value(row.body.clone()) {
                Ok(v) => v,
                Err(e) => {
                    outcome.record_error(format!("malformed repository payload {}: {e}", row.id));
                    self.buffer.release(row.id).await?;
                    continue;
                }
            };

            match self.processor.process(upstream).await {
                Ok(_) => {
                    self.buffer.mark_processed(row.id).await?;
                    outcome.processed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    self.buffer.release(row.id).await?;
                    outcome.record_error(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}

pub struct PullRequestIngestStage {
    buffer: Arc<dyn RawBufferStore>,
    processor: Arc<MergeRequestProcessor>,
}

impl PullRequestIngestStage {
    pub fn new(buffer: Arc<dyn RawBufferStore>, processor: Arc<MergeRequestProcessor>) -> Self {
        Self { buffer, processor }
    }
}

#[async_trait]
impl PipelineStage for PullRequestIngestStage {
    fn name(&self) -> &str {
        "ingest_pull_requests"
    }

    fn depends_on(&self) -> &[&str] {
        &["ingest_repositories"]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let rows = self.buffer.dequeue(RawPayloadKind::PullRequest, DEQUEUE_BATCH, &ctx.run_id).await?;
        let mut outcome = StageOutcome::default();

        for row in rows {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let payload: PullRequestPayload = match serde_json::from_value(row.body.clone()) {
                Ok(v) => v,
                Err(e) => {
                    outcome.record_error(format!("malformed pull request payload {}: {e}", row.id));
                    self.buffer.release(row.id).await?;
                    continue;
                }
            };

            match self
                .processor
                .process(payload.repository_id, payload.repository_upstream_id, payload.pull_request)
                .await
            {
                Ok(_) => {
                    self.buffer.mark_processed(row.id).await?;
                    outcome.processed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    self.buffer.release(row.id).await?;
                    outcome.record_error(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}

pub struct CommitIngestStage {
    buffer: Arc<dyn RawBufferStore>,
    processor: Arc<CommitProcessor>,
}

impl CommitIngestStage {
    pub fn new(buffer: Arc<dyn RawBufferStore>, processor: Arc<CommitProcessor>) -> Self {
        Self { buffer, processor }
    }
}

#[async_trait]
impl PipelineStage for CommitIngestStage {
    fn name(&self) -> &str {
        "ingest_commits"
    }

    fn depends_on(&self) -> &[&str] {
        &["ingest_pull_requests"]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let rows = self.buffer.dequeue(RawPayloadKind::Commit, DEQUEUE_BATCH, &ctx.run_id).await?;
        let mut outcome = StageOutcome::default();

        for row in rows {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let payload: CommitPayload = match serde_json::from_value(row.body.clone()) {
                Ok(v) => v,
                Err(e) => {
                    outcome.record_error(format!("malformed commit payload {}: {e}", row.id));
                    self.buffer.release(row.id).await?;
                    continue;
                }
            };

            match self
                .processor
                .process(
                    payload.repository_id,
                    payload.repository_upstream_id,
                    payload.merge_request,
                    payload.commit,
                    payload.files,
                )
                .await
            {
                Ok(()) => {
                    self.buffer.mark_processed(row.id).await?;
                    outcome.processed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    self.buffer.release(row.id).await?;
                    outcome.record_error(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}

pub struct ContributorIngestStage {
    buffer: Arc<dyn RawBufferStore>,
    processor: Arc<ContributorProcessor>,
}

impl ContributorIngestStage {
    pub fn new(buffer: Arc<dyn RawBufferStore>, processor: Arc<ContributorProcessor>) -> Self {
        Self { buffer, processor }
    }
}

#[async_trait]
impl PipelineStage for ContributorIngestStage {
    fn name(&self) -> &str {
        "ingest_contributor_sightings"
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let rows = self.buffer.dequeue(RawPayloadKind::User, DEQUEUE_BATCH, &ctx.run_id).await?;
        let mut outcome = StageOutcome::default();

        for row in rows {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let sighting: ContributorSighting = match serde_json::from_value(row.body.clone()) {
                Ok(v) => v,
                Err(e) => {
                    outcome.record_error(format!("malformed contributor sighting {}: {e}", row.id));
                    self.buffer.release(row.id).await?;
                    continue;
                }
            };

            match self.processor.resolve_or_create(sighting.upstream_id, sighting.login.as_deref()).await {
                Ok(_) => {
                    self.buffer.mark_processed(row.id).await?;
                    outcome.processed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    self.buffer.release(row.id).await?;
                    outcome.record_error(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}
