// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexableEntityType {
    Repository,
    Contributor,
    MergeRequest,
}

/// Per entity type sitemap progress. Emits no XML itself — the
/// Sitemap Indexer only maintains this metadata for the out-of-scope HTTP
/// layer to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SitemapMetadata {
    pub entity_type: IndexableEntityType,
    pub current_page: i64,
    pub url_count: i64,
    pub last_updated_at: DateTime<Utc>,
}

impl SitemapMetadata {
    pub fn new(entity_type: IndexableEntityType) -> Self {
        Self {
            entity_type,
            current_page: 0,
            url_count: 0,
            last_updated_at: Utc::now(),
        }
    }
}
