// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::local_id::PipelineRunId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Running,
    Success,
    Partial,
    Failed,
    Cancelled,
}

/// Append-only audit log of pipeline runs ("writes a PipelineHistory
/// row on start, completion, and on each fatal error").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineHistory {
    pub run_id: PipelineRunId,
    pub pipeline_type: String,
    pub outcome: RunOutcome,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_processed: i64,
    pub items_failed: i64,
    pub error_message: Option<String>,
}

impl PipelineHistory {
    pub fn started(pipeline_type: impl Into<String>) -> Self {
        Self {
            run_id: PipelineRunId::new(),
            pipeline_type: pipeline_type.into(),
            outcome: RunOutcome::Running,
            started_at: Utc::now(),
            completed_at: None,
            items_processed: 0,
            items_failed: 0,
            error_message: None,
        }
    }

    pub fn complete(&mut self, outcome: RunOutcome, items_processed: i64, items_failed: i64, error: Option<String>) {
        self.outcome = outcome;
        self.completed_at = Some(Utc::now());
        self.items_processed = items_processed;
        self.items_failed = items_failed;
        self.error_message = error;
    }
}
