// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fetch stages: the other half of the Raw Buffer. Each stage pulls one
//! upstream resource kind through the GitHub Client and enqueues it as a
//! JSON blob, leaving the matching ingest stage (`ingest_stage.rs`) to
//! dequeue and transform it. Tracked repositories come from the run's
//! `PipelineContext.params`, e.g. `{"repos": ["owner/name", ...]}`.
//!
//! Backpressure is checked once at stage entry rather than continuously:
//! if the buffer is already at or above the high-water mark, the stage
//! enqueues nothing this run and leaves the backlog to the ingest stage,
//! which drains it before the next scheduled run.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use ghsync_domain::entities::raw_payload::{RawPayload, RawPayloadKind};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::checkpoint_store::CheckpointStore;
use ghsync_domain::repositories::merge_request_store::MergeRequestStore;
use ghsync_domain::repositories::raw_buffer_store::RawBufferStore;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use ghsync_domain::services::github_client::{GithubClient, PageCursor};

use crate::application::commands::PipelineContext;
use crate::application::executor::PipelineStage;
use crate::application::ingest_stage::{CommitPayload, PullRequestPayload};
use crate::infrastructure::stages::StageOutcome;

#[derive(Debug, Deserialize, Default)]
struct FetchParams {
    #[serde(default)]
    repos: Vec<String>,
}

/// Reads `{"repos": ["owner/name", ...]}` out of the run's params, silently
/// ignoring entries that aren't `owner/name` shaped.
fn tracked_repos(ctx: &PipelineContext) -> Vec<(String, String)> {
    let params: FetchParams = serde_json::from_value(ctx.params.clone()).unwrap_or_default();
    params
        .repos
        .iter()
        .filter_map(|full_name| full_name.split_once('/'))
        .map(|(owner, name)| (owner.to_string(), name.to_string()))
        .collect()
}

pub struct RepositoryFetchStage {
    client: Arc<dyn GithubClient>,
    buffer: Arc<dyn RawBufferStore>,
    high_water_mark: i64,
}

impl RepositoryFetchStage {
    pub fn new(client: Arc<dyn GithubClient>, buffer: Arc<dyn RawBufferStore>, high_water_mark: u32) -> Self {
        Self { client, buffer, high_water_mark: high_water_mark as i64 }
    }
}

#[async_trait]
impl PipelineStage for RepositoryFetchStage {
    fn name(&self) -> &str {
        "fetch_repositories"
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let mut outcome = StageOutcome::default();

        if self.buffer.depth(RawPayloadKind::Repository).await? >= self.high_water_mark {
            outcome.skipped += 1;
            return Ok(outcome);
        }

        for (owner, name) in tracked_repos(ctx) {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            match self.client.get_repository(&owner, &name).await {
                Ok(repository) => {
                    let body = serde_json::to_value(&repository).map_err(|e| IngestError::Validation(e.to_string()))?;
                    self.buffer.enqueue(RawPayload::new(RawPayloadKind::Repository, body)).await?;
                    outcome.processed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    outcome.record_error(format!("fetching {owner}/{name}: {e}"));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}

pub struct PullRequestFetchStage {
    client: Arc<dyn GithubClient>,
    buffer: Arc<dyn RawBufferStore>,
    repositories: Arc<dyn RepositoryStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    high_water_mark: i64,
}

impl PullRequestFetchStage {
    pub fn new(
        client: Arc<dyn GithubClient>,
        buffer: Arc<dyn RawBufferStore>,
        repositories: Arc<dyn RepositoryStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        high_water_mark: u32,
    ) -> Self {
        Self { client, buffer, repositories, checkpoints, high_water_mark: high_water_mark as i64 }
    }
}

#[async_trait]
impl PipelineStage for PullRequestFetchStage {
    fn name(&self) -> &str {
        "fetch_pull_requests"
    }

    fn depends_on(&self) -> &[&str] {
        &["ingest_repositories"]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let mut outcome = StageOutcome::default();

        if self.buffer.depth(RawPayloadKind::PullRequest).await? >= self.high_water_mark {
            outcome.skipped += 1;
            return Ok(outcome);
        }

        for (owner, name) in tracked_repos(ctx) {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let full_name = format!("{owner}/{name}");
            let Some(repository) = self.repositories.get_by_full_name(&full_name).await? else {
                outcome.record_error(format!("{full_name} not yet ingested, deferring pull request fetch"));
                continue;
            };

            let mut cursor = match self.checkpoints.load(self.name(), &full_name).await? {
                Some(token) => PageCursor(Some(token)),
                None => PageCursor::default(),
            };
            loop {
                if ctx.cancellation.is_cancelled() {
                    return Err(IngestError::Cancelled);
                }

                let page = match self.client.list_repository_pull_requests(&owner, &name, cursor.clone()).await {
                    Ok(page) => page,
                    Err(e) if e.is_recoverable() => {
                        outcome.record_error(format!("listing pull requests for {full_name}: {e}"));
                        break;
                    }
                    Err(e) => return Err(e),
                };
                let next = page.next.clone();

                for pull_request in page.items {
                    if ctx.cancellation.is_cancelled() {
                        return Err(IngestError::Cancelled);
                    }

                    let payload = PullRequestPayload {
                        repository_id: repository.id,
                        repository_upstream_id: repository.upstream_id,
                        pull_request,
                    };
                    let body = serde_json::to_value(&payload).map_err(|e| IngestError::Validation(e.to_string()))?;
                    self.buffer.enqueue(RawPayload::new(RawPayloadKind::PullRequest, body)).await?;
                    outcome.processed += 1;
                }

                match &next.0 {
                    None => {
                        self.checkpoints.clear(self.name(), &full_name).await?;
                        break;
                    }
                    Some(token) => {
                        self.checkpoints.save(self.name(), &full_name, token).await?;
                    }
                }
                cursor = next;
            }
        }

        Ok(outcome)
    }
}

pub struct CommitFetchStage {
    client: Arc<dyn GithubClient>,
    buffer: Arc<dyn RawBufferStore>,
    repositories: Arc<dyn RepositoryStore>,
    merge_requests: Arc<dyn MergeRequestStore>,
    checkpoints: Arc<dyn CheckpointStore>,
    high_water_mark: i64,
}

impl CommitFetchStage {
    pub fn new(
        client: Arc<dyn GithubClient>,
        buffer: Arc<dyn RawBufferStore>,
        repositories: Arc<dyn RepositoryStore>,
        merge_requests: Arc<dyn MergeRequestStore>,
        checkpoints: Arc<dyn CheckpointStore>,
        high_water_mark: u32,
    ) -> Self {
        Self { client, buffer, repositories, merge_requests, checkpoints, high_water_mark: high_water_mark as i64 }
    }
}

#[async_trait]
impl PipelineStage for CommitFetchStage {
    fn name(&self) -> &str {
        "fetch_commits"
    }

    fn depends_on(&self) -> &[&str] {
        &["ingest_pull_requests"]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let mut outcome = StageOutcome::default();

        if self.buffer.depth(RawPayloadKind::Commit).await? >= self.high_water_mark {
            outcome.skipped += 1;
            return Ok(outcome);
        }

        for (owner, name) in tracked_repos(ctx) {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let full_name = format!("{owner}/{name}");
            let Some(repository) = self.repositories.get_by_full_name(&full_name).await? else {
                outcome.record_error(format!("{full_name} not yet ingested, deferring commit fetch"));
                continue;
            };

            // Re-lists pull request numbers rather than tracking them across
            // stages; each known number is resolved back to its local id via
            // the merge request store before commits are enqueued.
            let mut pr_cursor = match self.checkpoints.load(self.name(), &full_name).await? {
                Some(token) => PageCursor(Some(token)),
                None => PageCursor::default(),
            };
            loop {
                if ctx.cancellation.is_cancelled() {
                    return Err(IngestError::Cancelled);
                }

                let pr_page = match self.client.list_repository_pull_requests(&owner, &name, pr_cursor.clone()).await {
                    Ok(page) => page,
                    Err(e) if e.is_recoverable() => {
                        outcome.record_error(format!("listing pull requests for {full_name}: {e}"));
                        break;
                    }
                    Err(e) => return Err(e),
                };
                let pr_next = pr_page.next.clone();

                for pull_request in pr_page.items {
                    if ctx.cancellation.is_cancelled() {
                        return Err(IngestError::Cancelled);
                    }

                    let merge_request = self
                        .merge_requests
                        .get_by_repository_and_number(repository.upstream_id, pull_request.number)
                        .await?
                        .map(|mr| (mr.id, mr.upstream_number));

                    let commit_checkpoint_key = format!("{full_name}#{}", pull_request.number);
                    let mut commit_cursor = match self.checkpoints.load(self.name(), &commit_checkpoint_key).await? {
                        Some(token) => PageCursor(Some(token)),
                        None => PageCursor::default(),
                    };
                    loop {
                        if ctx.cancellation.is_cancelled() {
                            return Err(IngestError::Cancelled);
                        }

                        let commit_page = match self
                            .client
                            .list_pull_request_commits(&owner, &name, pull_request.number, commit_cursor.clone())
                            .await
                        {
                            Ok(page) => page,
                            Err(e) if e.is_recoverable() => {
                                outcome.record_error(format!(
                                    "listing commits for {full_name}#{}: {e}",
                                    pull_request.number
                                ));
                                break;
                            }
                            Err(e) => return Err(e),
                        };
                        let commit_next = commit_page.next.clone();

                        for commit in commit_page.items {
                            if ctx.cancellation.is_cancelled() {
                                return Err(IngestError::Cancelled);
                            }

                            let mut files = Vec::new();
                            let mut file_cursor = PageCursor::default();
                            loop {
                                if ctx.cancellation.is_cancelled() {
                                    return Err(IngestError::Cancelled);
                                }

                                let file_page = match self
                                    .client
                                    .list_commit_files(&owner, &name, &commit.sha, file_cursor.clone())
                                    .await
                                {
                                    Ok(page) => page,
                                    Err(e) if e.is_recoverable() => {
                                        outcome.record_error(format!("listing files for {full_name}@{}: {e}", commit.sha));
                                        break;
                                    }
                                    Err(e) => return Err(e),
                                };
                                let file_next = file_page.next.clone();
                                files.extend(file_page.items);
                                if file_next.0.is_none() {
                                    break;
                                }
                                file_cursor = file_next;
                            }

                            let payload = CommitPayload {
                                repository_id: repository.id,
                                repository_upstream_id: repository.upstream_id,
                                merge_request,
                                commit,
                                files,
                            };
                            let body = serde_json::to_value(&payload).map_err(|e| IngestError::Validation(e.to_string()))?;
                            self.buffer.enqueue(RawPayload::new(RawPayloadKind::Commit, body)).await?;
                            outcome.processed += 1;
                        }

                        match &commit_next.0 {
                            None => {
                                self.checkpoints.clear(self.name(), &commit_checkpoint_key).await?;
                                break;
                            }
                            Some(token) => {
                                self.checkpoints.save(self.name(), &commit_checkpoint_key, token).await?;
                            }
                        }
                        commit_cursor = commit_next;
                    }
                }

                match &pr_next.0 {
                    None => {
                        self.checkpoints.clear(self.name(), &full_name).await?;
                        break;
                    }
                    Some(token) => {
                        self.checkpoints.save(self.name(), &full_name, token).await?;
                    }
                }
                pr_cursor = pr_next;
            }
        }

        Ok(outcome)
    }
}
