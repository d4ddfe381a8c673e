// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Audit row written by every mutating Control API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlAudit {
    pub actor: String,
    pub action: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
    pub at: DateTime<Utc>,
}

impl ControlAudit {
    pub fn new(actor: impl Into<String>, action: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            before,
            after,
            at: Utc::now(),
        }
    }
}
