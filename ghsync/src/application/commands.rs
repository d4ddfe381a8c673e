// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Typed commands and shared run state for the Pipeline Executor and
//! the Control API surface it backs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-stage failure tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "threshold_percent")]
pub enum ErrorPolicy {
    FailFast,
    ContinueWithThreshold(f64),
    Skip,
}

impl ErrorPolicy {
    /// Whether a stage outcome's observed error rate breaches this policy.
    pub fn breaches(&self, error_rate_percent: f64) -> bool {
        match self {
            ErrorPolicy::FailFast => error_rate_percent > 0.0,
            ErrorPolicy::ContinueWithThreshold(threshold) => error_rate_percent > *threshold,
            ErrorPolicy::Skip => false,
        }
    }
}

/// Cooperative cancellation flag shared between the Scheduler/Control API and
/// a running Executor.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cross-stage shared state for one run;
/// deliberately not a module-level global.
#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub run_id: String,
    pub touched_repositories: HashSet<i64>,
    pub touched_contributors: HashSet<i64>,
    pub cancellation: CancellationFlag,
    /// The schedule's (or manual trigger's) JSON parameters, e.g.
    /// `{"repos": ["owner/name", ...]}`. Fetch stages read this to know what
    /// to pull; other stages generally ignore it.
    pub params: Value,
}

impl PipelineContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self::with_params(run_id, Value::Null)
    }

    pub fn with_params(run_id: impl Into<String>, params: Value) -> Self {
        Self {
            run_id: run_id.into(),
            touched_repositories: HashSet::new(),
            touched_contributors: HashSet::new(),
            cancellation: CancellationFlag::new(),
            params,
        }
    }
}

/// A manual trigger — bypasses cron but honors the
/// concurrency guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerCommand {
    pub pipeline_type: String,
    pub params: Value,
}

/// Upserts a pipeline's cron schedule via the Control API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleCommand {
    pub pipeline_type: String,
    pub cron: String,
    pub active: bool,
    pub params: Value,
    pub description: Option<String>,
}
