// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::value_objects::local_id::RawPayloadId;

/// The upstream kind a raw payload holds. A single tagged table
/// (`raw_payloads`) is used rather than one table per kind (allows either;
/// see DESIGN.md for the choice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawPayloadKind {
    Repository,
    PullRequest,
    Commit,
    User,
}

impl RawPayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawPayloadKind::Repository => "repository",
            RawPayloadKind::PullRequest => "pull_request",
            RawPayloadKind::Commit => "commit",
            RawPayloadKind::User => "user",
        }
    }
}

/// A fetched-but-unprocessed upstream JSON blob (Raw Buffer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    pub id: RawPayloadId,
    pub kind: RawPayloadKind,
    pub body: Value,
    pub processed: bool,
    /// Run id of the worker currently holding this row for processing, set by
    /// dequeue and cleared on commit or failure ("in-progress marker...
    /// scoped per worker via a run id").
    pub in_progress_run_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RawPayload {
    pub fn new(kind: RawPayloadKind, body: Value) -> Self {
        let now = Utc::now();
        Self {
            id: RawPayloadId::new(),
            kind,
            body,
            processed: false,
            in_progress_run_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
