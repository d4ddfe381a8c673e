// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::local_id::{CommitId, ContributorId, MergeRequestId, RepositoryId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl FileStatus {
    pub fn from_upstream(status: &str) -> Option<Self> {
        match status {
            "added" => Some(FileStatus::Added),
            "modified" => Some(FileStatus::Modified),
            "removed" | "deleted" => Some(FileStatus::Deleted),
            "renamed" => Some(FileStatus::Renamed),
            _ => None,
        }
    }
}

/// A single changed-file row for a commit: "a commit SHA may correspond to
/// N rows, one per changed file"; uniqueness is on (sha, repository, filename)
/// — callers aggregating commit counts MUST `COUNT(DISTINCT sha)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub sha: String,
    pub repository_id: RepositoryId,
    pub repository_upstream_id: i64,
    pub contributor_id: Option<ContributorId>,
    pub contributor_upstream_id: Option<i64>,
    pub merge_request_id: Option<MergeRequestId>,
    pub merge_request_upstream_id: Option<i64>,
    pub message: String,
    pub committed_at: DateTime<Utc>,
    pub parent_shas: Vec<String>,
    pub filename: String,
    pub file_status: FileStatus,
    pub additions: i64,
    pub deletions: i64,
    pub patch: Option<String>,
    pub complexity_score: f64,
    pub is_merge_commit: bool,
    pub is_enriched: bool,
}

/// Maximum patch text length; longer patches are truncated ("patch text
/// may be truncated above size limit S").
pub const MAX_PATCH_LEN: usize = 64 * 1024;

impl Commit {
    pub fn truncate_patch(patch: String) -> Option<String> {
        if patch.len() > MAX_PATCH_LEN {
            Some(patch[..MAX_PATCH_LEN].to_string())
        } else {
            Some(patch)
        }
    }

    pub fn is_merge(parent_count: usize) -> bool {
        parent_count >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_commit_detection() {
        assert!(!Commit::is_merge(1));
        assert!(Commit::is_merge(2));
        assert!(Commit::is_merge(3));
    }

    #[test]
    fn patch_truncation_caps_length() {
        let huge = "x".repeat(MAX_PATCH_LEN + 100);
        let truncated = Commit::truncate_patch(huge).unwrap();
        assert_eq!(truncated.len(), MAX_PATCH_LEN);
    }

    #[test]
    fn file_status_parses_github_removed_as_deleted() {
        assert_eq!(FileStatus::from_upstream("removed"), Some(FileStatus::Deleted));
    }
}
