// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `CommitStore`.

use async_trait::async_trait;
use ghsync_domain::entities::commit::{Commit, FileStatus};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::commit_store::CommitStore;
use ghsync_domain::value_objects::local_id::{ContributorId, LocalId, MergeRequestId, RepositoryId};
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

fn status_str(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Added => "added",
        FileStatus::Modified => "modified",
        FileStatus::Deleted => "deleted",
        FileStatus::Renamed => "renamed",
    }
}

fn status_from_str(s: &str) -> FileStatus {
    match s {
        "added" => FileStatus::Added,
        "deleted" => FileStatus::Deleted,
        "renamed" => FileStatus::Renamed,
        _ => FileStatus::Modified,
    }
}

fn row_to_commit(row: &sqlx::sqlite::SqliteRow) -> Result<Commit, IngestError> {
    let id_str: String = row.try_get("id").map_err(db_err)?;
    let repository_id: String = row.try_get("repository_id").map_err(db_err)?;
    let contributor_id: Option<String> = row.try_get("contributor_id").map_err(db_err)?;
    let merge_request_id: Option<String> = row.try_get("merge_request_id").map_err(db_err)?;
    let parent_shas: String = row.try_get("parent_shas").map_err(db_err)?;
    let file_status: String = row.try_get("file_status").map_err(db_err)?;

    Ok(Commit {
        id: LocalId::from_string(&id_str)?,
        sha: row.try_get("sha").map_err(db_err)?,
        repository_id: RepositoryId::from_string(&repository_id)?,
        repository_upstream_id: row.try_get("repository_upstream_id").map_err(db_err)?,
        contributor_id: contributor_id.map(|s| ContributorId::from_string(&s)).transpose()?,
        contributor_upstream_id: row.try_get("contributor_upstream_id").map_err(db_err)?,
        merge_request_id: merge_request_id.map(|s| MergeRequestId::from_string(&s)).transpose()?,
        merge_request_upstream_id: row.try_get("merge_request_upstream_id").map_err(db_err)?,
        message: row.try_get("message").map_err(db_err)?,
        committed_at: row.try_get("committed_at").map_err(db_err)?,
        parent_shas: serde_json::from_str(&parent_shas).map_err(IngestError::from)?,
        filename: row.try_get("filename").map_err(db_err)?,
        file_status: status_from_str(&file_status),
        additions: row.try_get("additions").map_err(db_err)?,
        deletions: row.try_get("deletions").map_err(db_err)?,
        patch: row.try_get("patch").map_err(db_err)?,
        complexity_score: row.try_get("complexity_score").map_err(db_err)?,
        is_merge_commit: row.try_get("is_merge_commit").map_err(db_err)?,
        is_enriched: row.try_get("is_enriched").map_err(db_err)?,
    })
}

pub struct SqliteCommitStore {
    pool: SqlitePool,
}

impl SqliteCommitStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn upsert_one(&self, commit: &Commit, tx: &mut sqlx::SqliteConnection) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            INSERT INTO commits (
                id, sha, repository_id, repository_upstream_id, contributor_id, contributor_upstream_id,
                merge_request_id, merge_request_upstream_id, message, committed_at, parent_shas, filename,
                file_status, additions, deletions, patch, complexity_score, is_merge_commit, is_enriched
            ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            ON CONFLICT(sha, repository_id, filename) DO UPDATE SET
                contributor_id = excluded.contributor_id,
                contributor_upstream_id = excluded.contributor_upstream_id,
                merge_request_id = excluded.merge_request_id,
                merge_request_upstream_id = excluded.merge_request_upstream_id,
                message = excluded.message,
                additions = excluded.additions,
                deletions = excluded.deletions,
                patch = excluded.patch,
                complexity_score = excluded.complexity_score,
                is_merge_commit = excluded.is_merge_commit,
                is_enriched = excluded.is_enriched
            "#,
        )
        .bind(commit.id.to_string())
        .bind(&commit.sha)
        .bind(commit.repository_id.to_string())
        .bind(commit.repository_upstream_id)
        .bind(commit.contributor_id.map(|v| v.to_string()))
        .bind(commit.contributor_upstream_id)
        .bind(commit.merge_request_id.map(|v| v.to_string()))
        .bind(commit.merge_request_upstream_id)
        .bind(&commit.message)
        .bind(commit.committed_at)
        .bind(serde_json::to_string(&commit.parent_shas).unwrap_or_default())
        .bind(&commit.filename)
        .bind(status_str(commit.file_status))
        .bind(commit.additions)
        .bind(commit.deletions)
        .bind(&commit.patch)
        .bind(commit.complexity_score)
        .bind(commit.is_merge_commit)
        .bind(commit.is_enriched)
        .execute(tx)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl CommitStore for SqliteCommitStore {
    async fn upsert(&self, commit: &Commit) -> Result<(), IngestError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        self.upsert_one(commit, &mut conn).await
    }

    async fn upsert_batch(&self, commits: &[Commit]) -> Result<(), IngestError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        for commit in commits {
            self.upsert_one(commit, &mut tx).await?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn distinct_commit_count(&self, repository_id: RepositoryId) -> Result<i64, IngestError> {
        let row = sqlx::query("SELECT COUNT(DISTINCT sha) AS c FROM commits WHERE repository_id = ?")
            .bind(repository_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("c").map_err(db_err)
    }

    async fn distinct_commit_count_total(&self) -> Result<i64, IngestError> {
        let row = sqlx::query("SELECT COUNT(DISTINCT sha) AS c FROM commits")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("c").map_err(db_err)
    }

    async fn list_unenriched(&self, limit: i64) -> Result<Vec<Commit>, IngestError> {
        let rows = sqlx::query("SELECT * FROM commits WHERE is_enriched = 0 ORDER BY committed_at ASC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_commit).collect()
    }
}
