// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::local_id::{ContributorId, MergeRequestId, RepositoryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeRequestState {
    Open,
    Closed,
    Merged,
}

impl MergeRequestState {
    /// Maps upstream state + merged flag → {open, merged, closed}.
    pub fn from_upstream(state: &str, merged: bool) -> Self {
        if merged {
            MergeRequestState::Merged
        } else if state.eq_ignore_ascii_case("closed") {
            MergeRequestState::Closed
        } else {
            MergeRequestState::Open
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: MergeRequestId,
    pub upstream_number: i64,
    pub repository_id: RepositoryId,
    pub repository_upstream_id: i64,
    pub author_id: ContributorId,
    pub author_upstream_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: MergeRequestState,
    pub is_draft: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub merger_id: Option<ContributorId>,
    pub commit_count: i64,
    pub additions: i64,
    pub deletions: i64,
    pub changed_files: i64,
    pub review_count: i64,
    pub comment_count: i64,
    pub complexity_score: f64,
    pub review_time_hours: Option<f64>,
    pub cycle_time_hours: Option<f64>,
    pub labels: Vec<String>,
    pub source_branch: Option<String>,
    pub target_branch: Option<String>,
    pub is_enriched: bool,
}

impl MergeRequest {
    /// `cycle_time_hours = merged_at - created_at` (null if open).
    pub fn cycle_time_hours(created_at: DateTime<Utc>, merged_at: Option<DateTime<Utc>>) -> Option<f64> {
        merged_at.map(|m| (m - created_at).num_seconds() as f64 / 3600.0)
    }

    /// `files × log(additions + deletions + 1)`.
    pub fn complexity_score(changed_files: i64, additions: i64, deletions: i64) -> f64 {
        changed_files as f64 * ((additions + deletions + 1) as f64).ln()
    }
}
