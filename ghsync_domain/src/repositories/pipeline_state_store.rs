// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store ports for the scheduler's own bookkeeping tables: `PipelineStatus`,
//! `PipelineSchedule`, and `PipelineHistory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::pipeline_history::{PipelineHistory, RunOutcome};
use crate::entities::pipeline_schedule::PipelineSchedule;
use crate::entities::pipeline_status::{PipelineState, PipelineStatus};
use crate::error::IngestError;
use crate::value_objects::local_id::PipelineRunId;

#[async_trait]
pub trait PipelineStatusStore: Send + Sync {
    async fn get(&self, pipeline_type: &str) -> Result<Option<PipelineStatus>, IngestError>;

    async fn list_all(&self) -> Result<Vec<PipelineStatus>, IngestError>;

    /// Seeds a default `idle` row if one is absent (startup contract).
    async fn ensure_seeded(&self, pipeline_type: &str) -> Result<(), IngestError>;

    /// Atomic `is_running: false -> true` compare-and-swap; returns `false`
    /// if another run already holds the guard.
    async fn try_acquire_run(&self, pipeline_type: &str) -> Result<bool, IngestError>;

    async fn release_run(&self, pipeline_type: &str, next_state: PipelineState, error: Option<String>) -> Result<(), IngestError>;

    async fn set_next_run_at(&self, pipeline_type: &str, next_run_at: DateTime<Utc>) -> Result<(), IngestError>;

    async fn reset(&self, pipeline_type: &str) -> Result<(), IngestError>;
}

#[async_trait]
pub trait PipelineScheduleStore: Send + Sync {
    async fn upsert(&self, schedule: &PipelineSchedule) -> Result<(), IngestError>;

    async fn get(&self, pipeline_type: &str) -> Result<Option<PipelineSchedule>, IngestError>;

    async fn list_all(&self) -> Result<Vec<PipelineSchedule>, IngestError>;

    async fn list_active(&self) -> Result<Vec<PipelineSchedule>, IngestError>;
}

#[async_trait]
pub trait PipelineHistoryStore: Send + Sync {
    async fn record_start(&self, history: &PipelineHistory) -> Result<(), IngestError>;

    async fn record_completion(
        &self,
        run_id: PipelineRunId,
        outcome: RunOutcome,
        items_processed: i64,
        items_failed: i64,
        error: Option<String>,
    ) -> Result<(), IngestError>;

    async fn list_recent(&self, pipeline_type: Option<&str>, limit: i64) -> Result<Vec<PipelineHistory>, IngestError>;
}
