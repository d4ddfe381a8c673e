// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Status state machine per pipeline type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Scheduled,
    Running,
    Error,
}

impl PipelineState {
    /// Validates a transition against the state machine below. `Reset` is
    /// handled by callers directly (any state → `idle`), not through this
    /// table, since it is an explicit override rather than a natural
    /// progression.
    pub fn can_transition_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Scheduled) | (Scheduled, Running) | (Running, Idle) | (Running, Error) | (Error, Running)
        )
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineState::Idle => "idle",
            PipelineState::Scheduled => "scheduled",
            PipelineState::Running => "running",
            PipelineState::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// One row per pipeline type. `is_running` is the field the scheduler's
/// concurrency guard CASes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub pipeline_type: String,
    pub state: PipelineState,
    pub is_running: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineStatus {
    pub fn idle(pipeline_type: impl Into<String>) -> Self {
        Self {
            pipeline_type: pipeline_type.into(),
            state: PipelineState::Idle,
            is_running: false,
            last_run_at: None,
            next_run_at: None,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn transition(&mut self, next: PipelineState) -> Result<(), IngestError> {
        if !self.state.can_transition_to(next) {
            return Err(IngestError::Validation(format!(
                "invalid pipeline state transition for '{}': {} -> {}",
                self.pipeline_type, self.state, next
            )));
        }
        self.state = next;
        self.is_running = matches!(next, PipelineState::Running);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `Reset` control command: any state → `idle`, unconditionally.
    pub fn reset(&mut self) {
        self.state = PipelineState::Idle;
        self.is_running = false;
        self.last_error = None;
        self.updated_at = Utc::now();
    }
}
