// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementations of `ContributorRepositoryStore` and `ContributorRankingStore`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghsync_domain::entities::contributor_ranking::ContributorRanking;
use ghsync_domain::entities::contributor_repository::ContributorRepository;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::analytics_store::{ContributorRankingStore, ContributorRepositoryStore};
use ghsync_domain::value_objects::local_id::{ContributorId, LocalId, RepositoryId};
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

pub struct SqliteContributorRepositoryStore {
    pool: SqlitePool,
}

impl SqliteContributorRepositoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContributorRepositoryStore for SqliteContributorRepositoryStore {
    async fn upsert(&self, junction: &ContributorRepository) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            INSERT INTO contributor_repositories (
                contributor_id, repository_id, commit_count, merged_pr_count, open_pr_count,
                review_count, issues_opened, first_contribution_at, last_contribution_at,
                lines_added, lines_removed, total_complexity
            ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?)
            ON CONFLICT(contributor_id, repository_id) DO UPDATE SET
                commit_count = excluded.commit_count,
                merged_pr_count = excluded.merged_pr_count,
                open_pr_count = excluded.open_pr_count,
                review_count = excluded.review_count,
                issues_opened = excluded.issues_opened,
                first_contribution_at = excluded.first_contribution_at,
                last_contribution_at = excluded.last_contribution_at,
                lines_added = excluded.lines_added,
                lines_removed = excluded.lines_removed,
                total_complexity = excluded.total_complexity
            "#,
        )
        .bind(junction.contributor_id.to_string())
        .bind(junction.repository_id.to_string())
        .bind(junction.commit_count)
        .bind(junction.merged_pr_count)
        .bind(junction.open_pr_count)
        .bind(junction.review_count)
        .bind(junction.issues_opened)
        .bind(junction.first_contribution_at)
        .bind(junction.last_contribution_at)
        .bind(junction.lines_added)
        .bind(junction.lines_removed)
        .bind(junction.total_complexity)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_for_contributor(&self, contributor_id: ContributorId) -> Result<Vec<ContributorRepository>, IngestError> {
        let rows = sqlx::query("SELECT * FROM contributor_repositories WHERE contributor_id = ?")
            .bind(contributor_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let contributor_id: String = row.try_get("contributor_id").map_err(db_err)?;
                let repository_id: String = row.try_get("repository_id").map_err(db_err)?;
                Ok(ContributorRepository {
                    contributor_id: ContributorId::from_string(&contributor_id)?,
                    repository_id: RepositoryId::from_string(&repository_id)?,
                    commit_count: row.try_get("commit_count").map_err(db_err)?,
                    merged_pr_count: row.try_get("merged_pr_count").map_err(db_err)?,
                    open_pr_count: row.try_get("open_pr_count").map_err(db_err)?,
                    review_count: row.try_get("review_count").map_err(db_err)?,
                    issues_opened: row.try_get("issues_opened").map_err(db_err)?,
                    first_contribution_at: row.try_get("first_contribution_at").map_err(db_err)?,
                    last_contribution_at: row.try_get("last_contribution_at").map_err(db_err)?,
                    lines_added: row.try_get("lines_added").map_err(db_err)?,
                    lines_removed: row.try_get("lines_removed").map_err(db_err)?,
                    total_complexity: row.try_get("total_complexity").map_err(db_err)?,
                })
            })
            .collect()
    }

    async fn recompute_all(&self) -> Result<(), IngestError> {
        let commit_rows = sqlx::query(
            r#"
            SELECT contributor_id, repository_id,
                   COUNT(DISTINCT sha) AS commit_count,
                   COALESCE(SUM(additions), 0) AS lines_added,
                   COALESCE(SUM(deletions), 0) AS lines_removed,
                   COALESCE(SUM(complexity_score), 0) AS total_complexity,
                   MIN(committed_at) AS first_at,
                   MAX(committed_at) AS last_at
            FROM commits
            WHERE contributor_id IS NOT NULL
            GROUP BY contributor_id, repository_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut junctions: HashMap<(String, String), ContributorRepository> = HashMap::new();
        for row in &commit_rows {
            let contributor_id_str: String = row.try_get("contributor_id").map_err(db_err)?;
            let repository_id_str: String = row.try_get("repository_id").map_err(db_err)?;
            let mut junction = ContributorRepository::new(
                ContributorId::from_string(&contributor_id_str)?,
                RepositoryId::from_string(&repository_id_str)?,
            );
            junction.commit_count = row.try_get("commit_count").map_err(db_err)?;
            junction.lines_added = row.try_get("lines_added").map_err(db_err)?;
            junction.lines_removed = row.try_get("lines_removed").map_err(db_err)?;
            junction.total_complexity = row.try_get("total_complexity").map_err(db_err)?;
            let first_at: Option<DateTime<Utc>> = row.try_get("first_at").map_err(db_err)?;
            let last_at: Option<DateTime<Utc>> = row.try_get("last_at").map_err(db_err)?;
            junction.first_contribution_at = first_at;
            junction.last_contribution_at = last_at;
            junctions.insert((contributor_id_str, repository_id_str), junction);
        }

        // GitHub has no per-repository "issues opened" feed in this pipeline
        // (no Issue entity is ingested), so `issues_opened` stays at its
        // zero default; only pull-request-derived counters are folded in here.
        let pr_rows = sqlx::query(
            r#"
            SELECT author_id AS contributor_id, repository_id,
                   SUM(CASE WHEN state = 'merged' THEN 1 ELSE 0 END) AS merged_pr_count,
                   SUM(CASE WHEN state = 'open' THEN 1 ELSE 0 END) AS open_pr_count,
                   COALESCE(SUM(review_count), 0) AS review_count,
                   MIN(created_at) AS first_at,
                   MAX(created_at) AS last_at
            FROM merge_requests
            GROUP BY author_id, repository_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        for row in &pr_rows {
            let contributor_id_str: String = row.try_get("contributor_id").map_err(db_err)?;
            let repository_id_str: String = row.try_get("repository_id").map_err(db_err)?;
            let contributor_id = ContributorId::from_string(&contributor_id_str)?;
            let repository_id = RepositoryId::from_string(&repository_id_str)?;
            let key = (contributor_id_str, repository_id_str);
            let junction = junctions
                .entry(key)
                .or_insert_with(|| ContributorRepository::new(contributor_id, repository_id));
            junction.merged_pr_count = row.try_get("merged_pr_count").map_err(db_err)?;
            junction.open_pr_count = row.try_get("open_pr_count").map_err(db_err)?;
            junction.review_count = row.try_get("review_count").map_err(db_err)?;
            if let Some(at) = row.try_get::<Option<DateTime<Utc>>, _>("first_at").map_err(db_err)? {
                junction.record_contribution_at(at);
            }
            if let Some(at) = row.try_get::<Option<DateTime<Utc>>, _>("last_at").map_err(db_err)? {
                junction.record_contribution_at(at);
            }
        }

        for junction in junctions.values() {
            self.upsert(junction).await?;
        }
        Ok(())
    }
}

pub struct SqliteContributorRankingStore {
    pool: SqlitePool,
}

impl SqliteContributorRankingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_ranking(row: &sqlx::sqlite::SqliteRow) -> Result<ContributorRanking, IngestError> {
    let contributor_id: String = row.try_get("contributor_id").map_err(db_err)?;
    let components: String = row.try_get("components").map_err(db_err)?;
    Ok(ContributorRanking {
        contributor_id: ContributorId::from_string(&contributor_id)?,
        total_score: row.try_get("total_score").map_err(db_err)?,
        components: serde_json::from_str(&components).map_err(IngestError::from)?,
        raw_lines_added: row.try_get("raw_lines_added").map_err(db_err)?,
        raw_lines_removed: row.try_get("raw_lines_removed").map_err(db_err)?,
        raw_commit_count: row.try_get("raw_commit_count").map_err(db_err)?,
        raw_review_count: row.try_get("raw_review_count").map_err(db_err)?,
        rank_position: row.try_get("rank_position").map_err(db_err)?,
        calculated_at: row.try_get("calculated_at").map_err(db_err)?,
    })
}

#[async_trait]
impl ContributorRankingStore for SqliteContributorRankingStore {
    async fn insert_snapshot(&self, ranking: &ContributorRanking) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            INSERT INTO contributor_rankings (
                contributor_id, total_score, components, raw_lines_added, raw_lines_removed,
                raw_commit_count, raw_review_count, rank_position, calculated_at
            ) VALUES (?,?,?,?,?,?,?,?,?)
            "#,
        )
        .bind(ranking.contributor_id.to_string())
        .bind(ranking.total_score)
        .bind(serde_json::to_string(&ranking.components).unwrap_or_default())
        .bind(ranking.raw_lines_added)
        .bind(ranking.raw_lines_removed)
        .bind(ranking.raw_commit_count)
        .bind(ranking.raw_review_count)
        .bind(ranking.rank_position)
        .bind(ranking.calculated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn latest_for_contributor(&self, contributor_id: ContributorId) -> Result<Option<ContributorRanking>, IngestError> {
        let row = sqlx::query(
            "SELECT * FROM contributor_rankings WHERE contributor_id = ? ORDER BY calculated_at DESC LIMIT 1",
        )
        .bind(contributor_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(row_to_ranking).transpose()
    }

    async fn latest_leaderboard(&self, limit: i64) -> Result<Vec<ContributorRanking>, IngestError> {
        let rows = sqlx::query(
            r#"
            SELECT cr.* FROM contributor_rankings cr
            INNER JOIN (
                SELECT contributor_id, MAX(calculated_at) AS max_at FROM contributor_rankings GROUP BY contributor_id
            ) latest ON cr.contributor_id = latest.contributor_id AND cr.calculated_at = latest.max_at
            ORDER BY cr.total_score DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_ranking).collect()
    }
}
