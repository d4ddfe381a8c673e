// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Cron scheduler and concurrency guard. Each active `PipelineSchedule` is
//! checked on every `tick`; a schedule whose next cron fire time has passed
//! is handed to its registered `PipelineExecutor`, guarded by an atomic
//! `try_acquire_run`/`release_run` pair so the same pipeline type never runs
//! twice concurrently. Multiple distinct pipeline types may run at once.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use ghsync_domain::entities::pipeline_history::RunOutcome;
use ghsync_domain::entities::pipeline_status::PipelineState;
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::pipeline_state_store::{PipelineScheduleStore, PipelineStatusStore};

use crate::application::commands::PipelineContext;
use crate::application::executor::{PipelineExecutor, RunSummary};

/// One tick's outcome for a schedule that was due and attempted.
#[derive(Debug, Clone)]
pub struct TickResult {
    pub pipeline_type: String,
    pub summary: RunSummary,
}

pub struct Scheduler {
    schedules: Arc<dyn PipelineScheduleStore>,
    status: Arc<dyn PipelineStatusStore>,
    executors: HashMap<String, Arc<PipelineExecutor>>,
}

impl Scheduler {
    pub fn new(
        schedules: Arc<dyn PipelineScheduleStore>,
        status: Arc<dyn PipelineStatusStore>,
        executors: HashMap<String, Arc<PipelineExecutor>>,
    ) -> Self {
        Self {
            schedules,
            status,
            executors,
        }
    }

    /// Runs every active, due schedule once. Returns one `TickResult` per
    /// pipeline type that was actually run this tick; schedules that are not
    /// yet due, or whose pipeline type is already running, are silently
    /// skipped (not an error — the concurrency guard is load-bearing, not
    /// exceptional).
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<Vec<TickResult>, IngestError> {
        let mut results = Vec::new();

        for schedule in self.schedules.list_active().await? {
            self.status.ensure_seeded(&schedule.pipeline_type).await?;

            let current = self
                .status
                .get(&schedule.pipeline_type)
                .await?
                .expect("ensure_seeded guarantees a row");

            if !is_due(&schedule.cron, current.next_run_at, now)? {
                continue;
            }

            if !self.status.try_acquire_run(&schedule.pipeline_type).await? {
                continue;
            }

            if !self.executors.contains_key(&schedule.pipeline_type) {
                self.status
                    .release_run(
                        &schedule.pipeline_type,
                        PipelineState::Error,
                        Some(format!("no executor registered for '{}'", schedule.pipeline_type)),
                    )
                    .await?;
                continue;
            }

            let run_id = format!("{}-{}", schedule.pipeline_type, now.timestamp());
            let result = self.run_acquired(&schedule.pipeline_type, run_id, schedule.parameters.clone()).await?;

            if let Some(next_fire) = schedule.cron.schedule()?.after(&now).next() {
                self.status.set_next_run_at(&schedule.pipeline_type, next_fire).await?;
            }

            results.push(result);
        }

        Ok(results)
    }

    /// Runs `pipeline_type` immediately, assuming the caller has already won
    /// the concurrency guard (typically via the Control API's `trigger`,
    /// which acquires it and writes the audit row before handing off here).
    /// Bypasses cron entirely, per "Trigger(type, params) bypasses cron but
    /// honors the concurrency guard" — the guard itself was already honored
    /// by the caller's acquire; this just runs and releases it.
    pub async fn run_acquired(&self, pipeline_type: &str, run_id: String, params: serde_json::Value) -> Result<TickResult, IngestError> {
        let executor = match self.executors.get(pipeline_type) {
            Some(executor) => executor.clone(),
            None => {
                self.status
                    .release_run(pipeline_type, PipelineState::Error, Some(format!("no executor registered for '{pipeline_type}'")))
                    .await?;
                return Ok(TickResult {
                    pipeline_type: pipeline_type.to_string(),
                    summary: RunSummary {
                        run_id,
                        outcome: RunOutcome::Failed,
                        stages: Vec::new(),
                        fatal_error: Some(format!("no executor registered for '{pipeline_type}'")),
                    },
                });
            }
        };

        let ctx = PipelineContext::with_params(run_id.clone(), params);
        info!(pipeline = %pipeline_type, run_id = %ctx.run_id, "run starting");

        let summary = executor.run(&ctx).await;
        let (next_state, error, summary) = match summary {
            Ok(summary) => {
                let state = match summary.outcome {
                    RunOutcome::Success | RunOutcome::Partial => PipelineState::Idle,
                    RunOutcome::Failed | RunOutcome::Cancelled => PipelineState::Error,
                    RunOutcome::Running => PipelineState::Error,
                };
                let error = summary.fatal_error.clone();
                (state, error, summary)
            }
            Err(e) => {
                warn!(pipeline = %pipeline_type, error = %e, "run failed fatally");
                let summary = RunSummary {
                    run_id: ctx.run_id.clone(),
                    outcome: RunOutcome::Failed,
                    stages: Vec::new(),
                    fatal_error: Some(e.to_string()),
                };
                (PipelineState::Error, Some(e.to_string()), summary)
            }
        };

        self.status.release_run(pipeline_type, next_state, error).await?;

        Ok(TickResult {
            pipeline_type: pipeline_type.to_string(),
            summary,
        })
    }
}

/// A schedule with no recorded `next_run_at` has never fired and is due
/// immediately; afterwards `next_run_at` drives due-ness directly.
fn is_due(
    _cron: &ghsync_domain::value_objects::cron_expression::CronExpression,
    next_run_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<bool, IngestError> {
    match next_run_at {
        Some(scheduled) => Ok(scheduled <= now),
        None => Ok(true),
    }
}
