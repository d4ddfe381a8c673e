// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `CheckpointStore`.

use async_trait::async_trait;
use chrono::Utc;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::checkpoint_store::CheckpointStore;
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn load(&self, stage_name: &str, checkpoint_key: &str) -> Result<Option<String>, IngestError> {
        let row = sqlx::query("SELECT cursor FROM pipeline_checkpoints WHERE stage_name = ? AND checkpoint_key = ?")
            .bind(stage_name)
            .bind(checkpoint_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.try_get("cursor").map_err(db_err)).transpose()
    }

    async fn save(&self, stage_name: &str, checkpoint_key: &str, cursor: &str) -> Result<(), IngestError> {
        sqlx::query(
            "INSERT INTO pipeline_checkpoints (stage_name, checkpoint_key, cursor, updated_at) VALUES (?,?,?,?)
             ON CONFLICT(stage_name, checkpoint_key) DO UPDATE SET cursor = excluded.cursor, updated_at = excluded.updated_at",
        )
        .bind(stage_name)
        .bind(checkpoint_key)
        .bind(cursor)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn clear(&self, stage_name: &str, checkpoint_key: &str) -> Result<(), IngestError> {
        sqlx::query("DELETE FROM pipeline_checkpoints WHERE stage_name = ? AND checkpoint_key = ?")
            .bind(stage_name)
            .bind(checkpoint_key)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
