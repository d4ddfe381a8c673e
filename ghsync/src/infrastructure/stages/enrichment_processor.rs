// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Enrichment processor: fetches the fuller profile for repositories
//! and contributors already present from the fast-path fetch, applying the
//! same never-clobber-with-null discipline as the initial upsert and
//! tracking `enrichment_attempts` so a poisoned upstream record does not
//! retry forever.

use std::sync::Arc;

use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::contributor_store::ContributorStore;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use ghsync_domain::services::github_client::GithubClient;

use crate::application::commands::PipelineContext;
use crate::infrastructure::stages::StageOutcome;

pub struct EnrichmentProcessor {
    repositories: Arc<dyn RepositoryStore>,
    contributors: Arc<dyn ContributorStore>,
    github: Arc<dyn GithubClient>,
    max_attempts: i32,
}

impl EnrichmentProcessor {
    pub fn new(
        repositories: Arc<dyn RepositoryStore>,
        contributors: Arc<dyn ContributorStore>,
        github: Arc<dyn GithubClient>,
        max_attempts: i32,
    ) -> Self {
        Self {
            repositories,
            contributors,
            github,
            max_attempts,
        }
    }

    pub async fn enrich_repositories(&self, limit: i64, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let mut outcome = StageOutcome::default();
        let candidates = self.repositories.list_unenriched(self.max_attempts, limit).await?;

        for mut repo in candidates {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let (owner, name) = match repo.full_name.split_once('/') {
                Some(parts) => parts,
                None => {
                    outcome.record_error(format!("malformed full_name: {}", repo.full_name));
                    continue;
                }
            };

            // Bumped before the call, not after: a permanently-404 entity
            // must count toward `max_attempts` even though the call itself
            // never returns, otherwise it is retried every run forever.
            repo.enrichment_attempts += 1;

            match self.github.get_repository(owner, name).await {
                Ok(upstream) => {
                    repo.description = upstream.description.or(repo.description);
                    repo.primary_language = upstream.language.or(repo.primary_language);
                    repo.license = upstream.license.or(repo.license);
                    repo.is_enriched = true;
                    self.repositories.upsert(&repo, false).await?;
                    outcome.processed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    self.repositories.upsert(&repo, false).await?;
                    outcome.record_error(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }

    pub async fn enrich_contributors(&self, limit: i64, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let mut outcome = StageOutcome::default();
        let candidates = self.contributors.list_unenriched(self.max_attempts, limit).await?;

        for mut contributor in candidates {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let login = match &contributor.username {
                Some(login) => login.clone(),
                None => {
                    outcome.skipped += 1;
                    continue;
                }
            };

            contributor.enrichment_attempts += 1;

            match self.github.get_user(&login).await {
                Ok(upstream) => {
                    contributor.apply_enrichment(upstream.username, upstream.display_name, upstream.bio);
                    contributor.follower_count = upstream.followers;
                    contributor.public_repos_count = upstream.public_repos;
                    self.contributors.upsert(&contributor, false).await?;
                    outcome.processed += 1;
                }
                Err(e) if e.is_recoverable() => {
                    self.contributors.upsert(&contributor, false).await?;
                    outcome.record_error(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}
