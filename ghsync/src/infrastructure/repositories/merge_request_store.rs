// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `MergeRequestStore`.

use async_trait::async_trait;
use ghsync_domain::entities::merge_request::{MergeRequest, MergeRequestState};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::merge_request_store::MergeRequestStore;
use ghsync_domain::value_objects::local_id::{ContributorId, LocalId, MergeRequestId, RepositoryId};
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

fn state_str(state: MergeRequestState) -> &'static str {
    match state {
        MergeRequestState::Open => "open",
        MergeRequestState::Closed => "closed",
        MergeRequestState::Merged => "merged",
    }
}

fn state_from_str(s: &str) -> MergeRequestState {
    match s {
        "merged" => MergeRequestState::Merged,
        "closed" => MergeRequestState::Closed,
        _ => MergeRequestState::Open,
    }
}

fn row_to_merge_request(row: &sqlx::sqlite::SqliteRow) -> Result<MergeRequest, IngestError> {
    let id_str: String = row.try_get("id").map_err(db_err)?;
    let repository_id: String = row.try_get("repository_id").map_err(db_err)?;
    let author_id: String = row.try_get("author_id").map_err(db_err)?;
    let merger_id: Option<String> = row.try_get("merger_id").map_err(db_err)?;
    let state: String = row.try_get("state").map_err(db_err)?;
    let labels: String = row.try_get("labels").map_err(db_err)?;

    Ok(MergeRequest {
        id: LocalId::from_string(&id_str)?,
        upstream_number: row.try_get("upstream_number").map_err(db_err)?,
        repository_id: RepositoryId::from_string(&repository_id)?,
        repository_upstream_id: row.try_get("repository_upstream_id").map_err(db_err)?,
        author_id: ContributorId::from_string(&author_id)?,
        author_upstream_id: row.try_get("author_upstream_id").map_err(db_err)?,
        title: row.try_get("title").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        state: state_from_str(&state),
        is_draft: row.try_get("is_draft").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
        closed_at: row.try_get("closed_at").map_err(db_err)?,
        merged_at: row.try_get("merged_at").map_err(db_err)?,
        merger_id: merger_id.map(|s| ContributorId::from_string(&s)).transpose()?,
        commit_count: row.try_get("commit_count").map_err(db_err)?,
        additions: row.try_get("additions").map_err(db_err)?,
        deletions: row.try_get("deletions").map_err(db_err)?,
        changed_files: row.try_get("changed_files").map_err(db_err)?,
        review_count: row.try_get("review_count").map_err(db_err)?,
        comment_count: row.try_get("comment_count").map_err(db_err)?,
        complexity_score: row.try_get("complexity_score").map_err(db_err)?,
        review_time_hours: row.try_get("review_time_hours").map_err(db_err)?,
        cycle_time_hours: row.try_get("cycle_time_hours").map_err(db_err)?,
        labels: serde_json::from_str(&labels).map_err(IngestError::from)?,
        source_branch: row.try_get("source_branch").map_err(db_err)?,
        target_branch: row.try_get("target_branch").map_err(db_err)?,
        is_enriched: row.try_get("is_enriched").map_err(db_err)?,
    })
}

pub struct SqliteMergeRequestStore {
    pool: SqlitePool,
}

impl SqliteMergeRequestStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MergeRequestStore for SqliteMergeRequestStore {
    async fn upsert(&self, merge_request: &MergeRequest) -> Result<MergeRequestId, IngestError> {
        let existing = self
            .get_by_repository_and_number(merge_request.repository_upstream_id, merge_request.upstream_number)
            .await?;
        let id = existing.as_ref().map(|e| e.id).unwrap_or(merge_request.id);

        sqlx::query(
            r#"
            INSERT INTO merge_requests (
                id, upstream_number, repository_id, repository_upstream_id, author_id,
                author_upstream_id, title, description, state, is_draft, created_at, updated_at,
                closed_at, merged_at, merger_id, commit_count, additions, deletions, changed_files,
                review_count, comment_count, complexity_score, review_time_hours, cycle_time_hours,
                labels, source_branch, target_branch, is_enriched
            ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            ON CONFLICT(repository_upstream_id, upstream_number) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                state = excluded.state,
                is_draft = excluded.is_draft,
                updated_at = excluded.updated_at,
                closed_at = excluded.closed_at,
                merged_at = excluded.merged_at,
                merger_id = excluded.merger_id,
                commit_count = excluded.commit_count,
                additions = excluded.additions,
                deletions = excluded.deletions,
                changed_files = excluded.changed_files,
                review_count = excluded.review_count,
                comment_count = excluded.comment_count,
                complexity_score = excluded.complexity_score,
                review_time_hours = excluded.review_time_hours,
                cycle_time_hours = excluded.cycle_time_hours,
                labels = excluded.labels,
                source_branch = excluded.source_branch,
                target_branch = excluded.target_branch,
                is_enriched = excluded.is_enriched
            "#,
        )
        .bind(id.to_string())
        .bind(merge_request.upstream_number)
        .bind(merge_request.repository_id.to_string())
        .bind(merge_request.repository_upstream_id)
        .bind(merge_request.author_id.to_string())
        .bind(merge_request.author_upstream_id)
        .bind(&merge_request.title)
        .bind(&merge_request.description)
        .bind(state_str(merge_request.state))
        .bind(merge_request.is_draft)
        .bind(merge_request.created_at)
        .bind(merge_request.updated_at)
        .bind(merge_request.closed_at)
        .bind(merge_request.merged_at)
        .bind(merge_request.merger_id.map(|v| v.to_string()))
        .bind(merge_request.commit_count)
        .bind(merge_request.additions)
        .bind(merge_request.deletions)
        .bind(merge_request.changed_files)
        .bind(merge_request.review_count)
        .bind(merge_request.comment_count)
        .bind(merge_request.complexity_score)
        .bind(merge_request.review_time_hours)
        .bind(merge_request.cycle_time_hours)
        .bind(serde_json::to_string(&merge_request.labels).unwrap_or_default())
        .bind(&merge_request.source_branch)
        .bind(&merge_request.target_branch)
        .bind(merge_request.is_enriched)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(id)
    }

    async fn get_by_repository_and_number(
        &self,
        repository_upstream_id: i64,
        number: i64,
    ) -> Result<Option<MergeRequest>, IngestError> {
        let row = sqlx::query("SELECT * FROM merge_requests WHERE repository_upstream_id = ? AND upstream_number = ?")
            .bind(repository_upstream_id)
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_merge_request).transpose()
    }

    async fn list_unenriched(&self, limit: i64) -> Result<Vec<MergeRequest>, IngestError> {
        let rows = sqlx::query("SELECT * FROM merge_requests WHERE is_enriched = 0 ORDER BY created_at ASC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_merge_request).collect()
    }

    async fn list_page(&self, page: i64, page_size: i64) -> Result<Vec<MergeRequest>, IngestError> {
        let rows = sqlx::query("SELECT * FROM merge_requests ORDER BY id ASC LIMIT ? OFFSET ?")
            .bind(page_size)
            .bind(page * page_size)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_merge_request).collect()
    }

    async fn count(&self) -> Result<i64, IngestError> {
        let row = sqlx::query("SELECT COUNT(*) AS c FROM merge_requests")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("c").map_err(db_err)
    }
}
