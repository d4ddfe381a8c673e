// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! GitHub Client port. Stage Processors depend only on this trait;
//! `ghsync`'s `infrastructure::github` module provides the real
//! rate-limited/retrying/circuit-breaking implementation, and tests can
//! substitute an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Cursor for resuming a paginated listing, opaque to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor(pub Option<String>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: PageCursor,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpstreamRepository {
    pub upstream_id: i64,
    pub full_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub watchers: i64,
    pub open_issues: i64,
    pub size: i64,
    pub language: Option<String>,
    pub license: Option<String>,
    pub default_branch: Option<String>,
    pub is_fork: bool,
    pub is_archived: bool,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub owner_upstream_id: Option<i64>,
    pub owner_login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpstreamUser {
    pub upstream_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub twitter: Option<String>,
    pub followers: i64,
    pub public_repos: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpstreamPullRequest {
    pub number: i64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub merged: bool,
    pub draft: bool,
    pub author_upstream_id: Option<i64>,
    pub author_login: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub merged_at: Option<chrono::DateTime<chrono::Utc>>,
    pub labels: Vec<String>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpstreamCommit {
    pub sha: String,
    pub message: String,
    pub committed_at: chrono::DateTime<chrono::Utc>,
    pub author_upstream_id: Option<i64>,
    pub parent_shas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpstreamCommitFile {
    pub filename: String,
    pub status: String,
    pub additions: i64,
    pub deletions: i64,
    pub patch: Option<String>,
}

/// Port for authenticated GitHub REST access. One call per upstream resource;
/// pagination, throttling, retry, and circuit breaking are all implementation
/// details of the infrastructure adapter, invisible here.
#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn get_repository(&self, owner: &str, name: &str) -> Result<UpstreamRepository, IngestError>;

    async fn list_repository_pull_requests(
        &self,
        owner: &str,
        name: &str,
        cursor: PageCursor,
    ) -> Result<Page<UpstreamPullRequest>, IngestError>;

    async fn get_pull_request(&self, owner: &str, name: &str, number: i64) -> Result<UpstreamPullRequest, IngestError>;

    async fn list_pull_request_commits(
        &self,
        owner: &str,
        name: &str,
        number: i64,
        cursor: PageCursor,
    ) -> Result<Page<UpstreamCommit>, IngestError>;

    async fn list_commit_files(
        &self,
        owner: &str,
        name: &str,
        sha: &str,
        cursor: PageCursor,
    ) -> Result<Page<UpstreamCommitFile>, IngestError>;

    async fn get_user(&self, login_or_id: &str) -> Result<UpstreamUser, IngestError>;

    async fn list_user_events(&self, login: &str, cursor: PageCursor) -> Result<Page<serde_json::Value>, IngestError>;
}
