// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::local_id::ContributorId;

/// A GitHub user (or bot / email-only author) contributing to tracked
/// repositories. `username` is nullable so that placeholder contributors
/// (invariant 2, resolution order) can be inserted before their
/// identity is fully known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub id: ContributorId,
    pub upstream_id: i64,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub twitter: Option<String>,
    pub follower_count: i64,
    pub public_repos_count: i64,
    pub impact_score: f64,
    pub role: Option<String>,
    pub top_languages: Vec<String>,
    pub organizations: Vec<String>,
    pub first_contribution_at: Option<DateTime<Utc>>,
    pub last_contribution_at: Option<DateTime<Utc>>,
    pub commit_count: i64,
    pub merged_pr_count: i64,
    pub rejected_pr_count: i64,
    pub review_count: i64,
    pub is_placeholder: bool,
    pub is_bot: bool,
    pub is_enriched: bool,
    pub enrichment_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contributor {
    /// Resolution branch (2)/(3) of the Contributor processor: a minimal
    /// record, placeholder when no reliable username is known.
    pub fn new_minimal(upstream_id: i64, username: Option<String>, is_placeholder: bool) -> Self {
        let now = Utc::now();
        Self {
            id: ContributorId::new(),
            upstream_id,
            username,
            display_name: None,
            avatar_url: None,
            bio: None,
            company: None,
            blog: None,
            location: None,
            twitter: None,
            follower_count: 0,
            public_repos_count: 0,
            impact_score: 0.0,
            role: None,
            top_languages: Vec::new(),
            organizations: Vec::new(),
            first_contribution_at: None,
            last_contribution_at: None,
            commit_count: 0,
            merged_pr_count: 0,
            rejected_pr_count: 0,
            review_count: 0,
            is_placeholder,
            is_bot: false,
            is_enriched: false,
            enrichment_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies enrichment data fetched from upstream, updating a placeholder
    /// into a real record without clearing previously populated fields
    /// (round-trip property: "upserting... does not clear previously
    /// populated fields").
    pub fn apply_enrichment(&mut self, username: Option<String>, display_name: Option<String>, bio: Option<String>) {
        if username.is_some() {
            self.username = username;
            self.is_placeholder = false;
        }
        if display_name.is_some() {
            self.display_name = display_name;
        }
        if bio.is_some() {
            self.bio = bio;
        }
        self.is_enriched = true;
        self.updated_at = Utc::now();
    }
}
