// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::local_id::ContributorId;
use crate::value_objects::ranking_weights::RankingComponents;

/// A per-contributor ranking snapshot (Ranking processor). Previous
/// rows are retained for trend analysis — a new row is inserted on every
/// ranking run rather than updating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributorRanking {
    pub contributor_id: ContributorId,
    pub total_score: f64,
    pub components: RankingComponents,
    pub raw_lines_added: i64,
    pub raw_lines_removed: i64,
    pub raw_commit_count: i64,
    pub raw_review_count: i64,
    pub rank_position: i64,
    pub calculated_at: DateTime<Utc>,
}
