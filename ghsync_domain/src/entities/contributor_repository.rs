// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::local_id::{ContributorId, RepositoryId};

/// Aggregated per-(contributor, repository) junction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorRepository {
    pub contributor_id: ContributorId,
    pub repository_id: RepositoryId,
    pub commit_count: i64,
    pub merged_pr_count: i64,
    pub open_pr_count: i64,
    pub review_count: i64,
    pub issues_opened: i64,
    pub first_contribution_at: Option<DateTime<Utc>>,
    pub last_contribution_at: Option<DateTime<Utc>>,
    pub lines_added: i64,
    pub lines_removed: i64,
    /// Sum of `Commit.complexity_score` across every commit row folded into
    /// this junction, used to weight ranking's commit-impact component by
    /// change complexity rather than raw commit count alone.
    pub total_complexity: f64,
}

impl ContributorRepository {
    pub fn new(contributor_id: ContributorId, repository_id: RepositoryId) -> Self {
        Self {
            contributor_id,
            repository_id,
            commit_count: 0,
            merged_pr_count: 0,
            open_pr_count: 0,
            review_count: 0,
            issues_opened: 0,
            first_contribution_at: None,
            last_contribution_at: None,
            lines_added: 0,
            lines_removed: 0,
            total_complexity: 0.0,
        }
    }

    /// Folds one more contribution event (a commit or PR observation) into
    /// the running aggregate, tracking the contribution window.
    pub fn record_contribution_at(&mut self, at: DateTime<Utc>) {
        self.first_contribution_at = Some(self.first_contribution_at.map_or(at, |f| f.min(at)));
        self.last_contribution_at = Some(self.last_contribution_at.map_or(at, |l| l.max(at)));
    }
}
