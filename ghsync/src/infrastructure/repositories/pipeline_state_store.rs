// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementations of the scheduler's bookkeeping store ports:
//! `PipelineStatusStore`, `PipelineScheduleStore`, `PipelineHistoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghsync_domain::entities::pipeline_history::{PipelineHistory, RunOutcome};
use ghsync_domain::entities::pipeline_schedule::PipelineSchedule;
use ghsync_domain::entities::pipeline_status::{PipelineState, PipelineStatus};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::pipeline_state_store::{PipelineHistoryStore, PipelineScheduleStore, PipelineStatusStore};
use ghsync_domain::value_objects::cron_expression::CronExpression;
use ghsync_domain::value_objects::local_id::{LocalId, PipelineRunId};
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

fn state_str(state: PipelineState) -> &'static str {
    match state {
        PipelineState::Idle => "idle",
        PipelineState::Scheduled => "scheduled",
        PipelineState::Running => "running",
        PipelineState::Error => "error",
    }
}

fn state_from_str(s: &str) -> PipelineState {
    match s {
        "scheduled" => PipelineState::Scheduled,
        "running" => PipelineState::Running,
        "error" => PipelineState::Error,
        _ => PipelineState::Idle,
    }
}

fn row_to_status(row: &sqlx::sqlite::SqliteRow) -> Result<PipelineStatus, IngestError> {
    let state: String = row.try_get("state").map_err(db_err)?;
    Ok(PipelineStatus {
        pipeline_type: row.try_get("pipeline_type").map_err(db_err)?,
        state: state_from_str(&state),
        is_running: row.try_get("is_running").map_err(db_err)?,
        last_run_at: row.try_get("last_run_at").map_err(db_err)?,
        next_run_at: row.try_get("next_run_at").map_err(db_err)?,
        last_error: row.try_get("last_error").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn row_to_schedule(row: &sqlx::sqlite::SqliteRow) -> Result<PipelineSchedule, IngestError> {
    let cron: String = row.try_get("cron").map_err(db_err)?;
    let parameters: String = row.try_get("parameters").map_err(db_err)?;
    Ok(PipelineSchedule {
        pipeline_type: row.try_get("pipeline_type").map_err(db_err)?,
        cron: CronExpression::parse(&cron)?,
        active: row.try_get("active").map_err(db_err)?,
        parameters: serde_json::from_str(&parameters).map_err(IngestError::from)?,
        description: row.try_get("description").map_err(db_err)?,
    })
}

fn outcome_str(outcome: RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Running => "running",
        RunOutcome::Success => "success",
        RunOutcome::Partial => "partial",
        RunOutcome::Failed => "failed",
        RunOutcome::Cancelled => "cancelled",
    }
}

fn outcome_from_str(s: &str) -> RunOutcome {
    match s {
        "success" => RunOutcome::Success,
        "partial" => RunOutcome::Partial,
        "failed" => RunOutcome::Failed,
        "cancelled" => RunOutcome::Cancelled,
        _ => RunOutcome::Running,
    }
}

fn row_to_history(row: &sqlx::sqlite::SqliteRow) -> Result<PipelineHistory, IngestError> {
    let run_id: String = row.try_get("run_id").map_err(db_err)?;
    let outcome: String = row.try_get("outcome").map_err(db_err)?;
    Ok(PipelineHistory {
        run_id: LocalId::from_string(&run_id)?,
        pipeline_type: row.try_get("pipeline_type").map_err(db_err)?,
        outcome: outcome_from_str(&outcome),
        started_at: row.try_get("started_at").map_err(db_err)?,
        completed_at: row.try_get("completed_at").map_err(db_err)?,
        items_processed: row.try_get("items_processed").map_err(db_err)?,
        items_failed: row.try_get("items_failed").map_err(db_err)?,
        error_message: row.try_get("error_message").map_err(db_err)?,
    })
}

pub struct SqlitePipelineStatusStore {
    pool: SqlitePool,
}

impl SqlitePipelineStatusStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineStatusStore for SqlitePipelineStatusStore {
    async fn get(&self, pipeline_type: &str) -> Result<Option<PipelineStatus>, IngestError> {
        let row = sqlx::query("SELECT * FROM pipeline_status WHERE pipeline_type = ?")
            .bind(pipeline_type)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_status).transpose()
    }

    async fn list_all(&self) -> Result<Vec<PipelineStatus>, IngestError> {
        let rows = sqlx::query("SELECT * FROM pipeline_status")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_status).collect()
    }

    async fn ensure_seeded(&self, pipeline_type: &str) -> Result<(), IngestError> {
        sqlx::query(
            "INSERT INTO pipeline_status (pipeline_type, state, is_running, updated_at) VALUES (?, 'idle', 0, ?) ON CONFLICT(pipeline_type) DO NOTHING",
        )
        .bind(pipeline_type)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn try_acquire_run(&self, pipeline_type: &str) -> Result<bool, IngestError> {
        self.ensure_seeded(pipeline_type).await?;
        let result = sqlx::query(
            "UPDATE pipeline_status SET is_running = 1, state = 'running', updated_at = ? WHERE pipeline_type = ? AND is_running = 0",
        )
        .bind(Utc::now())
        .bind(pipeline_type)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn release_run(&self, pipeline_type: &str, next_state: PipelineState, error: Option<String>) -> Result<(), IngestError> {
        sqlx::query(
            "UPDATE pipeline_status SET is_running = 0, state = ?, last_error = ?, last_run_at = ?, updated_at = ? WHERE pipeline_type = ?",
        )
        .bind(state_str(next_state))
        .bind(error)
        .bind(Utc::now())
        .bind(Utc::now())
        .bind(pipeline_type)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn set_next_run_at(&self, pipeline_type: &str, next_run_at: DateTime<Utc>) -> Result<(), IngestError> {
        sqlx::query("UPDATE pipeline_status SET next_run_at = ?, state = 'scheduled', updated_at = ? WHERE pipeline_type = ? AND is_running = 0")
            .bind(next_run_at)
            .bind(Utc::now())
            .bind(pipeline_type)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn reset(&self, pipeline_type: &str) -> Result<(), IngestError> {
        sqlx::query("UPDATE pipeline_status SET state = 'idle', is_running = 0, last_error = NULL, updated_at = ? WHERE pipeline_type = ?")
            .bind(Utc::now())
            .bind(pipeline_type)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

pub struct SqlitePipelineScheduleStore {
    pool: SqlitePool,
}

impl SqlitePipelineScheduleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineScheduleStore for SqlitePipelineScheduleStore {
    async fn upsert(&self, schedule: &PipelineSchedule) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            INSERT INTO pipeline_schedules (pipeline_type, cron, active, parameters, description)
            VALUES (?,?,?,?,?)
            ON CONFLICT(pipeline_type) DO UPDATE SET
                cron = excluded.cron,
                active = excluded.active,
                parameters = excluded.parameters,
                description = excluded.description
            "#,
        )
        .bind(&schedule.pipeline_type)
        .bind(schedule.cron.as_str())
        .bind(schedule.active)
        .bind(serde_json::to_string(&schedule.parameters).unwrap_or_default())
        .bind(&schedule.description)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, pipeline_type: &str) -> Result<Option<PipelineSchedule>, IngestError> {
        let row = sqlx::query("SELECT * FROM pipeline_schedules WHERE pipeline_type = ?")
            .bind(pipeline_type)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(row_to_schedule).transpose()
    }

    async fn list_all(&self) -> Result<Vec<PipelineSchedule>, IngestError> {
        let rows = sqlx::query("SELECT * FROM pipeline_schedules")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_schedule).collect()
    }

    async fn list_active(&self) -> Result<Vec<PipelineSchedule>, IngestError> {
        let rows = sqlx::query("SELECT * FROM pipeline_schedules WHERE active = 1")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_schedule).collect()
    }
}

pub struct SqlitePipelineHistoryStore {
    pool: SqlitePool,
}

impl SqlitePipelineHistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineHistoryStore for SqlitePipelineHistoryStore {
    async fn record_start(&self, history: &PipelineHistory) -> Result<(), IngestError> {
        sqlx::query(
            "INSERT INTO pipeline_history (run_id, pipeline_type, outcome, started_at, items_processed, items_failed) VALUES (?,?,?,?,0,0)",
        )
        .bind(history.run_id.to_string())
        .bind(&history.pipeline_type)
        .bind(outcome_str(history.outcome))
        .bind(history.started_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn record_completion(
        &self,
        run_id: PipelineRunId,
        outcome: RunOutcome,
        items_processed: i64,
        items_failed: i64,
        error: Option<String>,
    ) -> Result<(), IngestError> {
        sqlx::query(
            "UPDATE pipeline_history SET outcome = ?, completed_at = ?, items_processed = ?, items_failed = ?, error_message = ? WHERE run_id = ?",
        )
        .bind(outcome_str(outcome))
        .bind(Utc::now())
        .bind(items_processed)
        .bind(items_failed)
        .bind(error)
        .bind(run_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_recent(&self, pipeline_type: Option<&str>, limit: i64) -> Result<Vec<PipelineHistory>, IngestError> {
        let rows = match pipeline_type {
            Some(pt) => {
                sqlx::query("SELECT * FROM pipeline_history WHERE pipeline_type = ? ORDER BY started_at DESC LIMIT ?")
                    .bind(pt)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM pipeline_history ORDER BY started_at DESC LIMIT ?")
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;
        rows.iter().map(row_to_history).collect()
    }
}
