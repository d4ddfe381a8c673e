// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Stage Processors: one file per upstream resource kind, plus the
//! cross-cutting enrichment and ranking processors. Each processor is a pure
//! transform over `(input, Store read-view, GithubClient)` — side effects are
//! confined to transactional Store writes, never direct HTTP from a
//! processor.

pub mod commit_processor;
pub mod contributor_processor;
pub mod enrichment_processor;
pub mod merge_request_processor;
pub mod ranking_processor;
pub mod repository_processor;

pub use commit_processor::CommitProcessor;
pub use contributor_processor::ContributorProcessor;
pub use enrichment_processor::EnrichmentProcessor;
pub use merge_request_processor::MergeRequestProcessor;
pub use ranking_processor::RankingProcessor;
pub use repository_processor::RepositoryProcessor;

/// Outcome every stage reports back to the Executor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutcome {
    pub processed: i64,
    pub skipped: i64,
    pub failed: i64,
    pub errors: Vec<String>,
}

impl StageOutcome {
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(message.into());
    }

    /// Error rate as a percentage of items seen, for the continue-on-error
    /// threshold policy.
    pub fn error_rate(&self) -> f64 {
        let total = self.processed + self.skipped + self.failed;
        if total == 0 {
            0.0
        } else {
            self.failed as f64 / total as f64 * 100.0
        }
    }
}
