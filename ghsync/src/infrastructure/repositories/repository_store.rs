// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `RepositoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghsync_domain::entities::repository::Repository;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use ghsync_domain::value_objects::local_id::{ContributorId, LocalId, RepositoryId};
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

fn row_to_repository(row: &sqlx::sqlite::SqliteRow) -> Result<Repository, IngestError> {
    let owner_id: Option<String> = row.try_get("owner_id").map_err(db_err)?;
    let id_str: String = row.try_get("id").map_err(db_err)?;
    Ok(Repository {
        id: LocalId::from_string(&id_str)?,
        upstream_id: row.try_get("upstream_id").map_err(db_err)?,
        full_name: row.try_get("full_name").map_err(db_err)?,
        display_name: row.try_get("display_name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        url: row.try_get("url").map_err(db_err)?,
        stars: row.try_get("stars").map_err(db_err)?,
        forks: row.try_get("forks").map_err(db_err)?,
        watcher_count: row.try_get("watcher_count").map_err(db_err)?,
        open_issues_count: row.try_get("open_issues_count").map_err(db_err)?,
        size: row.try_get("size").map_err(db_err)?,
        primary_language: row.try_get("primary_language").map_err(db_err)?,
        license: row.try_get("license").map_err(db_err)?,
        default_branch: row.try_get("default_branch").map_err(db_err)?,
        is_fork: row.try_get("is_fork").map_err(db_err)?,
        is_archived: row.try_get("is_archived").map_err(db_err)?,
        last_updated_at: row.try_get::<Option<DateTime<Utc>>, _>("last_updated_at").map_err(db_err)?,
        owner_id: owner_id.map(|s| ContributorId::from_string(&s)).transpose()?,
        owner_upstream_id: row.try_get("owner_upstream_id").map_err(db_err)?,
        is_enriched: row.try_get("is_enriched").map_err(db_err)?,
        enrichment_attempts: row.try_get("enrichment_attempts").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

pub struct SqliteRepositoryStore {
    pool: SqlitePool,
}

impl SqliteRepositoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RepositoryStore for SqliteRepositoryStore {
    async fn upsert(&self, repository: &Repository, allow_null_overwrite: bool) -> Result<RepositoryId, IngestError> {
        let existing = self.get_by_upstream_id(repository.upstream_id).await?;
        let id = existing.as_ref().map(|e| e.id).unwrap_or(repository.id);

        let merged = match existing {
            Some(current) if !allow_null_overwrite => Repository {
                id,
                description: repository.description.clone().or(current.description),
                url: repository.url.clone().or(current.url),
                primary_language: repository.primary_language.clone().or(current.primary_language),
                license: repository.license.clone().or(current.license),
                default_branch: repository.default_branch.clone().or(current.default_branch),
                last_updated_at: repository.last_updated_at.or(current.last_updated_at),
                owner_id: repository.owner_id.or(current.owner_id),
                owner_upstream_id: repository.owner_upstream_id.or(current.owner_upstream_id),
                created_at: current.created_at,
                updated_at: Utc::now(),
                ..repository.clone()
            },
            _ => Repository {
                id,
                updated_at: Utc::now(),
                ..repository.clone()
            },
        };

        sqlx::query(
            r#"
            INSERT INTO repositories (
                id, upstream_id, full_name, display_name, description, url, stars, forks,
                watcher_count, open_issues_count, size, primary_language, license, default_branch,
                is_fork, is_archived, last_updated_at, owner_id, owner_upstream_id,
                is_enriched, enrichment_attempts, created_at, updated_at
            ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            ON CONFLICT(upstream_id) DO UPDATE SET
                full_name = excluded.full_name,
                display_name = excluded.display_name,
                description = excluded.description,
                url = excluded.url,
                stars = excluded.stars,
                forks = excluded.forks,
                watcher_count = excluded.watcher_count,
                open_issues_count = excluded.open_issues_count,
                size = excluded.size,
                primary_language = excluded.primary_language,
                license = excluded.license,
                default_branch = excluded.default_branch,
                is_fork = excluded.is_fork,
                is_archived = excluded.is_archived,
                last_updated_at = excluded.last_updated_at,
                owner_id = excluded.owner_id,
                owner_upstream_id = excluded.owner_upstream_id,
                is_enriched = excluded.is_enriched,
                enrichment_attempts = excluded.enrichment_attempts,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(merged.id.to_string())
        .bind(merged.upstream_id)
        .bind(&merged.full_name)
        .bind(&merged.display_name)
        .bind(&merged.description)
        .bind(&merged.url)
        .bind(merged.stars)
        .bind(merged.forks)
        .bind(merged.watcher_count)
        .bind(merged.open_issues_count)
        .bind(merged.size)
        .bind(&merged.primary_language)
        .bind(&merged.license)
        .bind(&merged.default_branch)
        .bind(merged.is_fork)
        .bind(merged.is_archived)
        .bind(merged.last_updated_at)
        .bind(merged.owner_id.map(|v| v.to_string()))
        .bind(merged.owner_upstream_id)
        .bind(merged.is_enriched)
        .bind(merged.enrichment_attempts)
        .bind(merged.created_at)
        .bind(merged.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn get_by_upstream_id(&self, upstream_id: i64) -> Result<Option<Repository>, IngestError> {
        let row = sqlx::query("SELECT * FROM repositories WHERE upstream_id = ?")
            .bind(upstream_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_repository).transpose()
    }

    async fn get_by_id(&self, id: RepositoryId) -> Result<Option<Repository>, IngestError> {
        let row = sqlx::query("SELECT * FROM repositories WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_repository).transpose()
    }

    async fn get_by_full_name(&self, full_name: &str) -> Result<Option<Repository>, IngestError> {
        let row = sqlx::query("SELECT * FROM repositories WHERE full_name = ?")
            .bind(full_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_repository).transpose()
    }

    async fn list_unenriched(&self, max_attempts: i32, limit: i64) -> Result<Vec<Repository>, IngestError> {
        let rows = sqlx::query(
            "SELECT * FROM repositories WHERE is_enriched = 0 AND enrichment_attempts < ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(max_attempts)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(row_to_repository).collect()
    }

    async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<Repository>, IngestError> {
        let rows = sqlx::query("SELECT * FROM repositories ORDER BY id ASC LIMIT ? OFFSET ?")
            .bind(page_size)
            .bind(page * page_size)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_repository).collect()
    }

    async fn count(&self) -> Result<i64, IngestError> {
        let row = sqlx::query("SELECT COUNT(*) AS c FROM repositories")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("c").map_err(db_err)
    }

    async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
        let result = sqlx::query("UPDATE repositories SET enrichment_attempts = 0, is_enriched = 0")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }
}
