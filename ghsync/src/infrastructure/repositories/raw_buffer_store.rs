// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `RawBufferStore`.

use async_trait::async_trait;
use ghsync_domain::entities::raw_payload::{RawPayload, RawPayloadKind};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::raw_buffer_store::RawBufferStore;
use ghsync_domain::value_objects::local_id::{LocalId, RawPayloadId};
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

fn kind_from_str(s: &str) -> RawPayloadKind {
    match s {
        "pull_request" => RawPayloadKind::PullRequest,
        "commit" => RawPayloadKind::Commit,
        "user" => RawPayloadKind::User,
        _ => RawPayloadKind::Repository,
    }
}

fn row_to_payload(row: &sqlx::sqlite::SqliteRow) -> Result<RawPayload, IngestError> {
    let id_str: String = row.try_get("id").map_err(db_err)?;
    let kind: String = row.try_get("kind").map_err(db_err)?;
    let body: String = row.try_get("body").map_err(db_err)?;
    Ok(RawPayload {
        id: LocalId::from_string(&id_str)?,
        kind: kind_from_str(&kind),
        body: serde_json::from_str(&body).map_err(IngestError::from)?,
        processed: row.try_get("processed").map_err(db_err)?,
        in_progress_run_id: row.try_get("in_progress_run_id").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

pub struct SqliteRawBufferStore {
    pool: SqlitePool,
}

impl SqliteRawBufferStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RawBufferStore for SqliteRawBufferStore {
    async fn enqueue(&self, payload: RawPayload) -> Result<RawPayloadId, IngestError> {
        sqlx::query(
            "INSERT INTO raw_payloads (id, kind, body, processed, in_progress_run_id, created_at, updated_at) VALUES (?,?,?,?,?,?,?)",
        )
        .bind(payload.id.to_string())
        .bind(payload.kind.as_str())
        .bind(serde_json::to_string(&payload.body).unwrap_or_default())
        .bind(payload.processed)
        .bind(&payload.in_progress_run_id)
        .bind(payload.created_at)
        .bind(payload.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(payload.id)
    }

    async fn dequeue(&self, kind: RawPayloadKind, limit: i64, run_id: &str) -> Result<Vec<RawPayload>, IngestError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let rows = sqlx::query(
            "SELECT id FROM raw_payloads WHERE kind = ? AND processed = 0 AND in_progress_run_id IS NULL ORDER BY created_at ASC LIMIT ?",
        )
        .bind(kind.as_str())
        .bind(limit)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err)?;

        let ids: Vec<String> = rows
            .iter()
            .map(|r| r.try_get::<String, _>("id").map_err(db_err))
            .collect::<Result<_, _>>()?;

        for id in &ids {
            sqlx::query("UPDATE raw_payloads SET in_progress_run_id = ?, updated_at = ? WHERE id = ?")
                .bind(run_id)
                .bind(chrono::Utc::now())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("SELECT * FROM raw_payloads WHERE id IN ({placeholders}) ORDER BY created_at ASC");
        let mut query = sqlx::query(&sql);
        for id in &ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter().map(row_to_payload).collect()
    }

    async fn mark_processed(&self, id: RawPayloadId) -> Result<(), IngestError> {
        sqlx::query("UPDATE raw_payloads SET processed = 1, in_progress_run_id = NULL, updated_at = ? WHERE id = ?")
            .bind(chrono::Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn release(&self, id: RawPayloadId) -> Result<(), IngestError> {
        sqlx::query("UPDATE raw_payloads SET in_progress_run_id = NULL, updated_at = ? WHERE id = ?")
            .bind(chrono::Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn depth(&self, kind: RawPayloadKind) -> Result<i64, IngestError> {
        let row = sqlx::query("SELECT COUNT(*) AS c FROM raw_payloads WHERE kind = ? AND processed = 0")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        row.try_get("c").map_err(db_err)
    }
}
