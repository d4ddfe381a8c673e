// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::cron_expression::CronExpression;

/// One row per pipeline type (unique), driving the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSchedule {
    pub pipeline_type: String,
    pub cron: CronExpression,
    pub active: bool,
    pub parameters: Value,
    pub description: Option<String>,
}

impl PipelineSchedule {
    pub fn new(pipeline_type: impl Into<String>, cron: CronExpression) -> Self {
        Self {
            pipeline_type: pipeline_type.into(),
            cron,
            active: true,
            parameters: Value::Null,
            description: None,
        }
    }
}
