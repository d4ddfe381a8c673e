// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Ranking processor: normalizes each contributor's raw activity into
//! eight [0,100] percentile-rank scores, combines them with `RankingWeights`
//! into a `total_score`, and inserts one append-only snapshot row per
//! contributor per run so that trend queries can read the history.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use ghsync_domain::entities::contributor::Contributor;
use ghsync_domain::entities::contributor_ranking::ContributorRanking;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::analytics_store::{ContributorRankingStore, ContributorRepositoryStore};
use ghsync_domain::repositories::commit_store::CommitStore;
use ghsync_domain::repositories::contributor_store::ContributorStore;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use ghsync_domain::value_objects::local_id::RepositoryId;
use ghsync_domain::value_objects::ranking_weights::{RankingComponents, RankingWeights};

use crate::application::commands::PipelineContext;
use crate::infrastructure::stages::StageOutcome;

pub struct RankingProcessor {
    contributors: Arc<dyn ContributorStore>,
    contributor_repositories: Arc<dyn ContributorRepositoryStore>,
    repositories: Arc<dyn RepositoryStore>,
    commits: Arc<dyn CommitStore>,
    rankings: Arc<dyn ContributorRankingStore>,
    weights: RankingWeights,
}

impl RankingProcessor {
    pub fn new(
        contributors: Arc<dyn ContributorStore>,
        contributor_repositories: Arc<dyn ContributorRepositoryStore>,
        repositories: Arc<dyn RepositoryStore>,
        commits: Arc<dyn CommitStore>,
        rankings: Arc<dyn ContributorRankingStore>,
        weights: RankingWeights,
    ) -> Self {
        Self {
            contributors,
            contributor_repositories,
            repositories,
            commits,
            rankings,
            weights,
        }
    }

    pub async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError> {
        let mut outcome = StageOutcome::default();
        let contributors = self.contributors.list_with_contributions().await?;
        if contributors.is_empty() {
            return Ok(outcome);
        }

        let mut repo_stars: HashMap<RepositoryId, i64> = HashMap::new();
        let mut repo_total_commits: HashMap<RepositoryId, i64> = HashMap::new();

        let mut raw: Vec<(Contributor, RawStats)> = Vec::with_capacity(contributors.len());
        for contributor in contributors {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let junctions = self.contributor_repositories.list_for_contributor(contributor.id).await?;
            let lines_added: i64 = junctions.iter().map(|j| j.lines_added).sum();
            let lines_removed: i64 = junctions.iter().map(|j| j.lines_removed).sum();
            let total_complexity: f64 = junctions.iter().map(|j| j.total_complexity).sum();

            let mut popularity = 0.0;
            let mut influence = 0.0;
            for junction in &junctions {
                let stars = match repo_stars.get(&junction.repository_id) {
                    Some(stars) => *stars,
                    None => {
                        let stars = self.repositories.get_by_id(junction.repository_id).await?.map(|r| r.stars).unwrap_or(0);
                        repo_stars.insert(junction.repository_id, stars);
                        stars
                    }
                };
                let total_commits = match repo_total_commits.get(&junction.repository_id) {
                    Some(count) => *count,
                    None => {
                        let count = self.commits.distinct_commit_count(junction.repository_id).await?;
                        repo_total_commits.insert(junction.repository_id, count);
                        count
                    }
                };

                let dampened_stars = dampen_stars(stars);
                popularity += dampened_stars;
                let share = junction.commit_count as f64 / total_commits.max(1) as f64;
                influence += share * dampened_stars;
            }

            raw.push((
                contributor,
                RawStats {
                    lines_added,
                    lines_removed,
                    total_complexity,
                    repo_popularity: popularity,
                    repo_influence: influence,
                },
            ));
        }

        let code_volumes: Vec<f64> = raw.iter().map(|(_, r)| (r.lines_added + r.lines_removed) as f64).collect();
        let commit_impacts: Vec<f64> = raw.iter().map(|(_, r)| r.total_complexity).collect();
        let review_counts: Vec<f64> = raw.iter().map(|(c, _)| c.review_count as f64).collect();
        let popularities: Vec<f64> = raw.iter().map(|(_, r)| r.repo_popularity).collect();
        let influences: Vec<f64> = raw.iter().map(|(_, r)| r.repo_influence).collect();
        let followers: Vec<f64> = raw.iter().map(|(c, _)| c.follower_count as f64).collect();

        let mut scored: Vec<(Contributor, RawStats, RankingComponents, f64)> = raw
            .into_iter()
            .map(|(contributor, stats)| {
                let lines_total = (stats.lines_added + stats.lines_removed) as f64;
                let efficiency = if stats.lines_removed == 0 {
                    100.0
                } else {
                    (stats.lines_added as f64 / (stats.lines_added + stats.lines_removed).max(1) as f64) * 100.0
                };
                let components = RankingComponents {
                    code_volume: percentile_rank(&code_volumes, lines_total),
                    code_efficiency: efficiency,
                    commit_impact: percentile_rank(&commit_impacts, stats.total_complexity),
                    collaboration: percentile_rank(&review_counts, contributor.review_count as f64),
                    repo_popularity: percentile_rank(&popularities, stats.repo_popularity),
                    repo_influence: percentile_rank(&influences, stats.repo_influence),
                    followers: percentile_rank(&followers, contributor.follower_count as f64),
                    profile_completeness: profile_completeness(&contributor),
                };
                let total = self.weights.total_score(&components);
                (contributor, stats, components, total)
            })
            .collect();

        scored.sort_by(|a, b| b.3.partial_cmp(&a.3).unwrap_or(std::cmp::Ordering::Equal));

        let now = Utc::now();
        for (rank_position, (contributor, stats, components, total_score)) in scored.into_iter().enumerate() {
            if ctx.cancellation.is_cancelled() {
                return Err(IngestError::Cancelled);
            }

            let snapshot = ContributorRanking {
                contributor_id: contributor.id,
                total_score,
                components,
                raw_lines_added: stats.lines_added,
                raw_lines_removed: stats.lines_removed,
                raw_commit_count: contributor.commit_count,
                raw_review_count: contributor.review_count,
                rank_position: rank_position as i64 + 1,
                calculated_at: now,
            };
            match self.rankings.insert_snapshot(&snapshot).await {
                Ok(()) => outcome.processed += 1,
                Err(e) => outcome.record_error(e.to_string()),
            }
        }

        Ok(outcome)
    }
}

struct RawStats {
    lines_added: i64,
    lines_removed: i64,
    total_complexity: f64,
    repo_popularity: f64,
    repo_influence: f64,
}

/// Logarithmic dampening so a handful of repositories with tens of thousands
/// of stars don't swamp every other popularity signal.
fn dampen_stars(stars: i64) -> f64 {
    (stars.max(0) as f64 + 1.0).ln()
}

/// Percentile rank of `value` within `population`: the fraction of the
/// population at or below `value`, with ties split evenly, scaled to
/// [0, 100]. Unlike min-max scaling this is stable under a single outlier.
fn percentile_rank(population: &[f64], value: f64) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    let below = population.iter().filter(|&&v| v < value).count() as f64;
    let equal = population.iter().filter(|&&v| v == value).count() as f64;
    ((below + 0.5 * equal) / population.len() as f64 * 100.0).clamp(0.0, 100.0)
}

fn profile_completeness(contributor: &Contributor) -> f64 {
    let fields = [
        contributor.display_name.is_some(),
        contributor.bio.is_some(),
        contributor.company.is_some(),
        contributor.location.is_some(),
        contributor.avatar_url.is_some(),
    ];
    let filled = fields.iter().filter(|f| **f).count() as f64;
    filled / fields.len() as f64 * 100.0
}
