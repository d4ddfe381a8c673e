// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Concrete `reqwest`-based [`GithubClient`] implementation.
//!
//! Every call goes through [`GithubHttpClient::get`], which composes the
//! circuit breaker, token pool, conditional-request cache, and retry/backoff
//! mechanisms from the sibling modules before handing a parsed JSON body back
//! to the resource-specific mapping functions below.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, IF_MODIFIED_SINCE, IF_NONE_MATCH, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{instrument, warn};

use sqlx::SqlitePool;

use ghsync_domain::error::IngestError;
use ghsync_domain::services::github_client::{
    GithubClient, Page, PageCursor, UpstreamCommit, UpstreamCommitFile, UpstreamPullRequest, UpstreamRepository,
    UpstreamUser,
};

use super::cache::{CacheEntry, ConditionalCache};
use super::circuit_breaker::CircuitBreaker;
use super::pagination::next_cursor;
use super::retry::retry_with_backoff;
use super::token_pool::TokenPool;
use crate::infrastructure::metrics::METRICS;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
const MAX_RETRIES: u32 = 4;
const CACHE_CAPACITY: usize = 2048;
const CIRCUIT_WINDOW: usize = 20;
const CIRCUIT_ERROR_RATE: f64 = 0.5;
const CIRCUIT_COOLDOWN: Duration = Duration::from_secs(30);

pub struct GithubHttpClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenPool,
    breaker: CircuitBreaker,
    cache: ConditionalCache,
}

impl GithubHttpClient {
    pub fn new(tokens: Vec<String>) -> Self {
        Self::with_base_url(tokens, DEFAULT_BASE_URL.to_string())
    }

    /// Used by integration tests to point at a `wiremock` server instead of
    /// the real GitHub API.
    pub fn with_base_url(tokens: Vec<String>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            tokens: TokenPool::new(tokens),
            breaker: CircuitBreaker::new(CIRCUIT_WINDOW, CIRCUIT_ERROR_RATE, CIRCUIT_COOLDOWN),
            cache: ConditionalCache::new(CACHE_CAPACITY),
        }
    }

    /// Persists the conditional-request cache to `pool` so a restart can
    /// hydrate it instead of starting with no `ETag`s. Call [`Self::hydrate_cache`]
    /// once after construction to load whatever the previous run left behind.
    pub fn with_persistent_cache(tokens: Vec<String>, base_url: String, pool: SqlitePool) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            tokens: TokenPool::new(tokens),
            breaker: CircuitBreaker::new(CIRCUIT_WINDOW, CIRCUIT_ERROR_RATE, CIRCUIT_COOLDOWN),
            cache: ConditionalCache::with_pool(CACHE_CAPACITY, pool),
        }
    }

    pub async fn hydrate_cache(&self) {
        self.cache.hydrate().await;
    }

    #[instrument(skip(self), fields(path))]
    async fn get(&self, path: &str) -> Result<(Value, HeaderMap), IngestError> {
        self.breaker.check(path)?;

        let result = retry_with_backoff(path, MAX_RETRIES, || self.attempt(path)).await;

        match &result {
            Ok(_) => {
                self.breaker.record_success();
                METRICS.requests_total.with_label_values(&["success"]).inc();
            }
            Err(err) if err.category() == ghsync_domain::error::ErrorCategory::UpstreamTransient => {
                self.breaker.record_failure();
                METRICS.requests_total.with_label_values(&["transient_error"]).inc();
            }
            Err(_) => {
                METRICS.requests_total.with_label_values(&["permanent_error"]).inc();
            }
        }

        result
    }

    async fn attempt(&self, path: &str) -> Result<(Value, HeaderMap), (IngestError, Option<Duration>)> {
        let Some((token_index, token)) = self.tokens.select() else {
            let wait = self
                .tokens
                .earliest_reset()
                .and_then(|reset| (reset - Utc::now()).to_std().ok())
                .unwrap_or(Duration::from_secs(60));
            return Err((
                IngestError::UpstreamTransient { resource: path.to_string(), message: "token pool exhausted".to_string() },
                Some(wait),
            ));
        };

        let cached = self.cache.get(path);
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&token)
            .header(USER_AGENT, "ghsync");

        if let Some(entry) = &cached {
            if let Some(etag) = &entry.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = &entry.last_modified {
                request = request.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| (IngestError::UpstreamTransient { resource: path.to_string(), message: e.to_string() }, None))?;

        let status = response.status();
        let headers = response.headers().clone();
        self.tokens.record_headers(token_index, read_remaining(&headers), read_reset(&headers));

        match status {
            StatusCode::NOT_MODIFIED => {
                if let Some(entry) = cached {
                    Ok((entry.body, headers))
                } else {
                    Err((
                        IngestError::UpstreamTransient {
                            resource: path.to_string(),
                            message: "304 with no cached body".to_string(),
                        },
                        None,
                    ))
                }
            }
            StatusCode::OK => {
                let etag = header_str(&headers, reqwest::header::ETAG);
                let last_modified = header_str(&headers, reqwest::header::LAST_MODIFIED);
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| (IngestError::Validation(format!("malformed JSON from {path}: {e}")), None))?;
                self.cache.put(path.to_string(), CacheEntry { etag, last_modified, body: body.clone() }).await;
                Ok((body, headers))
            }
            StatusCode::UNAUTHORIZED => {
                warn!(path, "quarantining token after 401");
                self.tokens.quarantine(token_index);
                Err((
                    IngestError::UpstreamTransient { resource: path.to_string(), message: "token rejected (401)".to_string() },
                    None,
                ))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err((
                    IngestError::UpstreamTransient { resource: path.to_string(), message: "rate limited (429)".to_string() },
                    Some(retry_after.unwrap_or(Duration::from_secs(5))),
                ))
            }
            StatusCode::FORBIDDEN if read_remaining(&headers) == Some(0) => {
                let wait = read_reset(&headers)
                    .and_then(|reset| (reset - Utc::now()).to_std().ok())
                    .unwrap_or(Duration::from_secs(60));
                Err((
                    IngestError::UpstreamTransient { resource: path.to_string(), message: "primary rate limit exhausted".to_string() },
                    Some(wait),
                ))
            }
            StatusCode::NOT_FOUND | StatusCode::GONE => Err((
                IngestError::UpstreamPermanent { resource: path.to_string(), status: status.as_u16(), message: "not found".to_string() },
                None,
            )),
            s if s.is_server_error() => Err((
                IngestError::UpstreamTransient { resource: path.to_string(), message: format!("server error {s}") },
                None,
            )),
            s => Err((
                IngestError::UpstreamPermanent { resource: path.to_string(), status: s.as_u16(), message: format!("unexpected status {s}") },
                None,
            )),
        }
    }
}

fn header_str(headers: &HeaderMap, name: impl reqwest::header::AsHeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| s.to_string())
}

fn read_remaining(headers: &HeaderMap) -> Option<i64> {
    header_value(headers, "x-ratelimit-remaining").and_then(|v| v.parse().ok())
}

fn read_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let epoch: i64 = header_value(headers, "x-ratelimit-reset")?.parse().ok()?;
    Utc.timestamp_opt(epoch, 0).single()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v: &HeaderValue| v.to_str().ok())
}

#[derive(Debug, Deserialize)]
struct GhOwner {
    id: i64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhLicense {
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhRepository {
    id: i64,
    full_name: String,
    description: Option<String>,
    html_url: Option<String>,
    stargazers_count: i64,
    forks_count: i64,
    watchers_count: i64,
    open_issues_count: i64,
    size: i64,
    language: Option<String>,
    license: Option<GhLicense>,
    default_branch: Option<String>,
    fork: bool,
    archived: bool,
    updated_at: Option<DateTime<Utc>>,
    owner: Option<GhOwner>,
}

impl From<GhRepository> for UpstreamRepository {
    fn from(r: GhRepository) -> Self {
        UpstreamRepository {
            upstream_id: r.id,
            full_name: r.full_name,
            description: r.description,
            url: r.html_url,
            stars: r.stargazers_count,
            forks: r.forks_count,
            watchers: r.watchers_count,
            open_issues: r.open_issues_count,
            size: r.size,
            language: r.language,
            license: r.license.and_then(|l| l.key),
            default_branch: r.default_branch,
            is_fork: r.fork,
            is_archived: r.archived,
            updated_at: r.updated_at,
            owner_upstream_id: r.owner.as_ref().map(|o| o.id),
            owner_login: r.owner.map(|o| o.login),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhUser {
    id: i64,
    login: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    company: Option<String>,
    blog: Option<String>,
    location: Option<String>,
    twitter_username: Option<String>,
    followers: i64,
    public_repos: i64,
}

impl From<GhUser> for UpstreamUser {
    fn from(u: GhUser) -> Self {
        UpstreamUser {
            upstream_id: u.id,
            username: u.login,
            display_name: u.name,
            avatar_url: u.avatar_url,
            bio: u.bio,
            company: u.company,
            blog: u.blog,
            location: u.location,
            twitter: u.twitter_username,
            followers: u.followers,
            public_repos: u.public_repos,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GhBranchRef {
    #[serde(rename = "ref")]
    branch_ref: String,
}

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: i64,
    title: String,
    body: Option<String>,
    state: String,
    #[serde(default)]
    merged: bool,
    draft: bool,
    user: Option<GhOwner>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: Vec<GhLabel>,
    head: Option<GhBranchRef>,
    base: Option<GhBranchRef>,
}

impl From<GhPullRequest> for UpstreamPullRequest {
    fn from(p: GhPullRequest) -> Self {
        let merged = p.merged || p.merged_at.is_some();
        UpstreamPullRequest {
            number: p.number,
            title: p.title,
            body: p.body,
            state: p.state,
            merged,
            draft: p.draft,
            author_upstream_id: p.user.as_ref().map(|u| u.id),
            author_login: p.user.map(|u| u.login),
            created_at: p.created_at,
            updated_at: p.updated_at,
            closed_at: p.closed_at,
            merged_at: p.merged_at,
            labels: p.labels.into_iter().map(|l| l.name).collect(),
            source_branch: p.head.map(|h| h.branch_ref),
            target_branch: p.base.map(|b| b.branch_ref),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhCommitAuthor {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GhCommitDetail {
    message: String,
    author: GhCommitAuthor,
}

#[derive(Debug, Deserialize)]
struct GhCommitParent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GhCommit {
    sha: String,
    commit: GhCommitDetail,
    author: Option<GhOwner>,
    #[serde(default)]
    parents: Vec<GhCommitParent>,
}

impl From<GhCommit> for UpstreamCommit {
    fn from(c: GhCommit) -> Self {
        UpstreamCommit {
            sha: c.sha,
            message: c.commit.message,
            committed_at: c.commit.author.date,
            author_upstream_id: c.author.map(|a| a.id),
            parent_shas: c.parents.into_iter().map(|p| p.sha).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhCommitFile {
    filename: String,
    status: String,
    additions: i64,
    deletions: i64,
    patch: Option<String>,
}

impl From<GhCommitFile> for UpstreamCommitFile {
    fn from(f: GhCommitFile) -> Self {
        UpstreamCommitFile { filename: f.filename, status: f.status, additions: f.additions, deletions: f.deletions, patch: f.patch }
    }
}

impl GithubHttpClient {
    /// Resolves the next request path: either the first page of `base`, or
    /// the path portion of the `Link`-header URL carried by `cursor`.
    fn path_with_cursor(&self, base: &str, cursor: &PageCursor) -> String {
        match &cursor.0 {
            Some(next) => next.strip_prefix(&self.base_url).unwrap_or(next).to_string(),
            None => base.to_string(),
        }
    }
}

#[async_trait]
impl GithubClient for GithubHttpClient {
    async fn get_repository(&self, owner: &str, name: &str) -> Result<UpstreamRepository, IngestError> {
        let (body, _) = self.get(&format!("/repos/{owner}/{name}")).await?;
        let repo: GhRepository = serde_json::from_value(body).map_err(IngestError::from)?;
        Ok(repo.into())
    }

    async fn list_repository_pull_requests(
        &self,
        owner: &str,
        name: &str,
        cursor: PageCursor,
    ) -> Result<Page<UpstreamPullRequest>, IngestError> {
        let base = format!("/repos/{owner}/{name}/pulls?state=all&per_page=100&sort=updated&direction=desc");
        let path = self.path_with_cursor(&base, &cursor);
        let (body, headers) = self.get(&path).await?;
        let items: Vec<GhPullRequest> = serde_json::from_value(body).map_err(IngestError::from)?;
        Ok(Page { items: items.into_iter().map(Into::into).collect(), next: next_cursor(&headers) })
    }

    async fn get_pull_request(&self, owner: &str, name: &str, number: i64) -> Result<UpstreamPullRequest, IngestError> {
        let (body, _) = self.get(&format!("/repos/{owner}/{name}/pulls/{number}")).await?;
        let pr: GhPullRequest = serde_json::from_value(body).map_err(IngestError::from)?;
        Ok(pr.into())
    }

    async fn list_pull_request_commits(
        &self,
        owner: &str,
        name: &str,
        number: i64,
        cursor: PageCursor,
    ) -> Result<Page<UpstreamCommit>, IngestError> {
        let base = format!("/repos/{owner}/{name}/pulls/{number}/commits?per_page=100");
        let path = self.path_with_cursor(&base, &cursor);
        let (body, headers) = self.get(&path).await?;
        let items: Vec<GhCommit> = serde_json::from_value(body).map_err(IngestError::from)?;
        Ok(Page { items: items.into_iter().map(Into::into).collect(), next: next_cursor(&headers) })
    }

    async fn list_commit_files(
        &self,
        owner: &str,
        name: &str,
        sha: &str,
        cursor: PageCursor,
    ) -> Result<Page<UpstreamCommitFile>, IngestError> {
        let base = format!("/repos/{owner}/{name}/commits/{sha}?per_page=100");
        let path = self.path_with_cursor(&base, &cursor);
        let (body, headers) = self.get(&path).await?;
        let files = body.get("files").cloned().unwrap_or(Value::Array(Vec::new()));
        let items: Vec<GhCommitFile> = serde_json::from_value(files).map_err(IngestError::from)?;
        Ok(Page { items: items.into_iter().map(Into::into).collect(), next: next_cursor(&headers) })
    }

    async fn get_user(&self, login_or_id: &str) -> Result<UpstreamUser, IngestError> {
        let (body, _) = self.get(&format!("/users/{login_or_id}")).await?;
        let user: GhUser = serde_json::from_value(body).map_err(IngestError::from)?;
        Ok(user.into())
    }

    async fn list_user_events(&self, login: &str, cursor: PageCursor) -> Result<Page<Value>, IngestError> {
        let base = format!("/users/{login}/events/public?per_page=100");
        let path = self.path_with_cursor(&base, &cursor);
        let (body, headers) = self.get(&path).await?;
        let items: Vec<Value> = serde_json::from_value(body).map_err(IngestError::from)?;
        Ok(Page { items, next: next_cursor(&headers) })
    }
}
