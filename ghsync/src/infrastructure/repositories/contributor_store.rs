// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `ContributorStore`.

use async_trait::async_trait;
use chrono::Utc;
use ghsync_domain::entities::contributor::Contributor;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::contributor_store::ContributorStore;
use ghsync_domain::value_objects::local_id::{ContributorId, LocalId};
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

fn row_to_contributor(row: &sqlx::sqlite::SqliteRow) -> Result<Contributor, IngestError> {
    let id_str: String = row.try_get("id").map_err(db_err)?;
    let top_languages: String = row.try_get("top_languages").map_err(db_err)?;
    let organizations: String = row.try_get("organizations").map_err(db_err)?;
    Ok(Contributor {
        id: LocalId::from_string(&id_str)?,
        upstream_id: row.try_get("upstream_id").map_err(db_err)?,
        username: row.try_get("username").map_err(db_err)?,
        display_name: row.try_get("display_name").map_err(db_err)?,
        avatar_url: row.try_get("avatar_url").map_err(db_err)?,
        bio: row.try_get("bio").map_err(db_err)?,
        company: row.try_get("company").map_err(db_err)?,
        blog: row.try_get("blog").map_err(db_err)?,
        location: row.try_get("location").map_err(db_err)?,
        twitter: row.try_get("twitter").map_err(db_err)?,
        follower_count: row.try_get("follower_count").map_err(db_err)?,
        public_repos_count: row.try_get("public_repos_count").map_err(db_err)?,
        impact_score: row.try_get("impact_score").map_err(db_err)?,
        role: row.try_get("role").map_err(db_err)?,
        top_languages: serde_json::from_str(&top_languages).map_err(IngestError::from)?,
        organizations: serde_json::from_str(&organizations).map_err(IngestError::from)?,
        first_contribution_at: row.try_get("first_contribution_at").map_err(db_err)?,
        last_contribution_at: row.try_get("last_contribution_at").map_err(db_err)?,
        commit_count: row.try_get("commit_count").map_err(db_err)?,
        merged_pr_count: row.try_get("merged_pr_count").map_err(db_err)?,
        rejected_pr_count: row.try_get("rejected_pr_count").map_err(db_err)?,
        review_count: row.try_get("review_count").map_err(db_err)?,
        is_placeholder: row.try_get("is_placeholder").map_err(db_err)?,
        is_bot: row.try_get("is_bot").map_err(db_err)?,
        is_enriched: row.try_get("is_enriched").map_err(db_err)?,
        enrichment_attempts: row.try_get("enrichment_attempts").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

pub struct SqliteContributorStore {
    pool: SqlitePool,
}

impl SqliteContributorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContributorStore for SqliteContributorStore {
    async fn upsert(&self, contributor: &Contributor, allow_null_overwrite: bool) -> Result<ContributorId, IngestError> {
        let existing = self.get_by_upstream_id(contributor.upstream_id).await?;
        let id = existing.as_ref().map(|e| e.id).unwrap_or(contributor.id);

        let merged = match existing {
            Some(current) if !allow_null_overwrite => Contributor {
                id,
                username: contributor.username.clone().or(current.username),
                display_name: contributor.display_name.clone().or(current.display_name),
                avatar_url: contributor.avatar_url.clone().or(current.avatar_url),
                bio: contributor.bio.clone().or(current.bio),
                company: contributor.company.clone().or(current.company),
                blog: contributor.blog.clone().or(current.blog),
                location: contributor.location.clone().or(current.location),
                twitter: contributor.twitter.clone().or(current.twitter),
                role: contributor.role.clone().or(current.role),
                is_placeholder: contributor.is_placeholder && current.is_placeholder,
                created_at: current.created_at,
                updated_at: Utc::now(),
                ..contributor.clone()
            },
            _ => Contributor {
                id,
                updated_at: Utc::now(),
                ..contributor.clone()
            },
        };

        sqlx::query(
            r#"
            INSERT INTO contributors (
                id, upstream_id, username, display_name, avatar_url, bio, company, blog, location,
                twitter, follower_count, public_repos_count, impact_score, role, top_languages,
                organizations, first_contribution_at, last_contribution_at, commit_count,
                merged_pr_count, rejected_pr_count, review_count, is_placeholder, is_bot,
                is_enriched, enrichment_attempts, created_at, updated_at
            ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            ON CONFLICT(upstream_id) DO UPDATE SET
                username = excluded.username,
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                bio = excluded.bio,
                company = excluded.company,
                blog = excluded.blog,
                location = excluded.location,
                twitter = excluded.twitter,
                follower_count = excluded.follower_count,
                public_repos_count = excluded.public_repos_count,
                impact_score = excluded.impact_score,
                role = excluded.role,
                top_languages = excluded.top_languages,
                organizations = excluded.organizations,
                first_contribution_at = excluded.first_contribution_at,
                last_contribution_at = excluded.last_contribution_at,
                commit_count = excluded.commit_count,
                merged_pr_count = excluded.merged_pr_count,
                rejected_pr_count = excluded.rejected_pr_count,
                review_count = excluded.review_count,
                is_placeholder = excluded.is_placeholder,
                is_bot = excluded.is_bot,
                is_enriched = excluded.is_enriched,
                enrichment_attempts = excluded.enrichment_attempts,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(merged.id.to_string())
        .bind(merged.upstream_id)
        .bind(&merged.username)
        .bind(&merged.display_name)
        .bind(&merged.avatar_url)
        .bind(&merged.bio)
        .bind(&merged.company)
        .bind(&merged.blog)
        .bind(&merged.location)
        .bind(&merged.twitter)
        .bind(merged.follower_count)
        .bind(merged.public_repos_count)
        .bind(merged.impact_score)
        .bind(&merged.role)
        .bind(serde_json::to_string(&merged.top_languages).unwrap_or_default())
        .bind(serde_json::to_string(&merged.organizations).unwrap_or_default())
        .bind(merged.first_contribution_at)
        .bind(merged.last_contribution_at)
        .bind(merged.commit_count)
        .bind(merged.merged_pr_count)
        .bind(merged.rejected_pr_count)
        .bind(merged.review_count)
        .bind(merged.is_placeholder)
        .bind(merged.is_bot)
        .bind(merged.is_enriched)
        .bind(merged.enrichment_attempts)
        .bind(merged.created_at)
        .bind(merged.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Contributor>, IngestError> {
        let row = sqlx::query("SELECT * FROM contributors WHERE upstream_id = ?")
            .bind(upstream_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_contributor).transpose()
    }

    async fn get_by_id(&self, id: ContributorId) -> Result<Option<Contributor>, IngestError> {
        let row = sqlx::query("SELECT * FROM contributors WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_contributor).transpose()
    }

    async fn list_unenriched(&self, max_attempts: i32, limit: i64) -> Result<Vec<Contributor>, IngestError> {
        let rows = sqlx::query(
            "SELECT * FROM contributors WHERE is_enriched = 0 AND enrichment_attempts < ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(max_attempts)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_contributor).collect()
    }

    async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<Contributor>, IngestError> {
        let rows = sqlx::query("SELECT * FROM contributors ORDER BY id ASC LIMIT ? OFFSET ?")
            .bind(page_size)
            .bind(page * page_size)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_contributor).collect()
    }

    async fn list_with_contributions(&self) -> Result<Vec<Contributor>, IngestError> {
        let rows = sqlx::query("SELECT * FROM contributors WHERE commit_count > 0 OR merged_pr_count > 0 OR review_count > 0")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_contributor).collect()
    }

    async fn count(&self) -> Result<i64, IngestError> {
        let row = sqlx::query("SELECT COUNT(*) AS c FROM contributors")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("c").map_err(db_err)
    }

    async fn merge_duplicate(&self, canonical_id: ContributorId, duplicate_id: ContributorId) -> Result<(), IngestError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let canonical = canonical_id.to_string();
        let duplicate = duplicate_id.to_string();

        for (table, column) in [
            ("merge_requests", "author_id"),
            ("merge_requests", "merger_id"),
            ("commits", "contributor_id"),
            ("contributor_repositories", "contributor_id"),
            ("contributor_rankings", "contributor_id"),
        ] {
            let sql = format!("UPDATE {table} SET {column} = ? WHERE {column} = ?");
            sqlx::query(&sql)
                .bind(&canonical)
                .bind(&duplicate)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        sqlx::query("DELETE FROM contributors WHERE id = ?")
            .bind(&duplicate)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
        let result = sqlx::query("UPDATE contributors SET enrichment_attempts = 0, is_enriched = 0")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn recompute_aggregates(&self) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            UPDATE contributors SET
                commit_count = COALESCE(
                    (SELECT COUNT(DISTINCT sha) FROM commits WHERE commits.contributor_id = contributors.id), 0
                ),
                merged_pr_count = COALESCE(
                    (SELECT COUNT(*) FROM merge_requests
                     WHERE merge_requests.author_id = contributors.id AND merge_requests.state = 'merged'), 0
                ),
                rejected_pr_count = COALESCE(
                    (SELECT COUNT(*) FROM merge_requests
                     WHERE merge_requests.author_id = contributors.id AND merge_requests.state = 'closed'), 0
                ),
                review_count = COALESCE(
                    (SELECT SUM(review_count) FROM merge_requests WHERE merge_requests.author_id = contributors.id), 0
                ),
                first_contribution_at = (
                    SELECT MIN(at) FROM (
                        SELECT MIN(committed_at) AS at FROM commits WHERE commits.contributor_id = contributors.id
                        UNION ALL
                        SELECT MIN(created_at) AS at FROM merge_requests WHERE merge_requests.author_id = contributors.id
                    )
                ),
                last_contribution_at = (
                    SELECT MAX(at) FROM (
                        SELECT MAX(committed_at) AS at FROM commits WHERE commits.contributor_id = contributors.id
                        UNION ALL
                        SELECT MAX(created_at) AS at FROM merge_requests WHERE merge_requests.author_id = contributors.id
                    )
                )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
