// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `ControlAuditStore`.

use async_trait::async_trait;
use ghsync_domain::entities::control_audit::ControlAudit;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::control_audit_store::ControlAuditStore;
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

pub struct SqliteControlAuditStore {
    pool: SqlitePool,
}

impl SqliteControlAuditStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ControlAuditStore for SqliteControlAuditStore {
    async fn record(&self, entry: ControlAudit) -> Result<(), IngestError> {
        sqlx::query("INSERT INTO control_audit (actor, action, before, after, at) VALUES (?,?,?,?,?)")
            .bind(&entry.actor)
            .bind(&entry.action)
            .bind(entry.before.map(|v| v.to_string()))
            .bind(entry.after.map(|v| v.to_string()))
            .bind(entry.at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ControlAudit>, IngestError> {
        let rows = sqlx::query("SELECT * FROM control_audit ORDER BY at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                let before: Option<String> = row.try_get("before").map_err(db_err)?;
                let after: Option<String> = row.try_get("after").map_err(db_err)?;
                Ok(ControlAudit {
                    actor: row.try_get("actor").map_err(db_err)?,
                    action: row.try_get("action").map_err(db_err)?,
                    before: before.map(|s| serde_json::from_str(&s)).transpose().map_err(IngestError::from)?,
                    after: after.map(|s| serde_json::from_str(&s)).transpose().map_err(IngestError::from)?,
                    at: row.try_get("at").map_err(db_err)?,
                })
            })
            .collect()
    }
}
