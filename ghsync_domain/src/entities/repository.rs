// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::local_id::{ContributorId, RepositoryId};

/// A GitHub repository, as persisted by the Repository processor.
///
/// `owner_id`/`owner_upstream_id` are nullable to break the cyclic FK between
/// Repository and Contributor: the owner may not yet exist locally when the
/// repository row is first written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub upstream_id: i64,
    pub full_name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub stars: i64,
    pub forks: i64,
    pub watcher_count: i64,
    pub open_issues_count: i64,
    pub size: i64,
    pub primary_language: Option<String>,
    pub license: Option<String>,
    pub default_branch: Option<String>,
    pub is_fork: bool,
    pub is_archived: bool,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub owner_id: Option<ContributorId>,
    pub owner_upstream_id: Option<i64>,
    pub is_enriched: bool,
    pub enrichment_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repository {
    /// Constructs the minimal record the Repository processor writes on
    /// first sight of an upstream repo, before enrichment.
    pub fn new_minimal(upstream_id: i64, full_name: String, stars: i64) -> Self {
        let now = Utc::now();
        Self {
            id: RepositoryId::new(),
            upstream_id,
            display_name: full_name.rsplit('/').next().unwrap_or(&full_name).to_string(),
            full_name,
            description: None,
            url: None,
            stars,
            forks: 0,
            watcher_count: 0,
            open_issues_count: 0,
            size: 0,
            primary_language: None,
            license: None,
            default_branch: None,
            is_fork: false,
            is_archived: false,
            last_updated_at: None,
            owner_id: None,
            owner_upstream_id: None,
            is_enriched: false,
            enrichment_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Activity classification from a commit-frequency sample, when available
    /// ("classifies activity level... via commit frequency read from
    /// Store if available").
    pub fn classify_activity(commits_last_30_days: Option<u64>) -> ActivityLevel {
        match commits_last_30_days {
            Some(n) if n >= 30 => ActivityLevel::High,
            Some(n) if n >= 5 => ActivityLevel::Medium,
            Some(_) => ActivityLevel::Low,
            None => ActivityLevel::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    High,
    Medium,
    Low,
    Unknown,
}
