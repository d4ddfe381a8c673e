// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Configurable weights for the `ContributorRanking` total score. The exact
//! weighting is not specified upstream (see DESIGN.md); this exposes it as
//! configuration with documented defaults rather than guessing.

use serde::{Deserialize, Serialize};

/// Weight applied to each normalized [0,100] component score when computing
/// `total_score`. Defaults equal-weight all eight components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub code_volume: f64,
    pub code_efficiency: f64,
    pub commit_impact: f64,
    pub collaboration: f64,
    pub repo_popularity: f64,
    pub repo_influence: f64,
    pub followers: f64,
    pub profile_completeness: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            code_volume: 0.125,
            code_efficiency: 0.125,
            commit_impact: 0.125,
            collaboration: 0.125,
            repo_popularity: 0.125,
            repo_influence: 0.125,
            followers: 0.125,
            profile_completeness: 0.125,
        }
    }
}

impl RankingWeights {
    pub fn sum(&self) -> f64 {
        self.code_volume
            + self.code_efficiency
            + self.commit_impact
            + self.collaboration
            + self.repo_popularity
            + self.repo_influence
            + self.followers
            + self.profile_completeness
    }

    /// Weighted sum of already-normalized [0,100] component scores.
    #[allow(clippy::too_many_arguments)]
    pub fn total_score(&self, components: &RankingComponents) -> f64 {
        components.code_volume * self.code_volume
            + components.code_efficiency * self.code_efficiency
            + components.commit_impact * self.commit_impact
            + components.collaboration * self.collaboration
            + components.repo_popularity * self.repo_popularity
            + components.repo_influence * self.repo_influence
            + components.followers * self.followers
            + components.profile_completeness * self.profile_completeness
    }
}

/// The eight normalized [0,100] component scores for one contributor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingComponents {
    pub code_volume: f64,
    pub code_efficiency: f64,
    pub commit_impact: f64,
    pub collaboration: f64,
    pub repo_popularity: f64,
    pub repo_influence: f64,
    pub followers: f64,
    pub profile_completeness: f64,
}
