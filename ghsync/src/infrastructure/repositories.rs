// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite-backed implementations of the `ghsync_domain::repositories` store
//! ports, plus the schema/migration helpers.

pub mod analytics_store;
pub mod checkpoint_store;
pub mod commit_store;
pub mod contributor_store;
pub mod control_audit_store;
pub mod merge_request_store;
pub mod pipeline_state_store;
pub mod raw_buffer_store;
pub mod repository_store;
pub mod schema;
pub mod sitemap_store;

pub use analytics_store::{SqliteContributorRankingStore, SqliteContributorRepositoryStore};
pub use checkpoint_store::SqliteCheckpointStore;
pub use commit_store::SqliteCommitStore;
pub use contributor_store::SqliteContributorStore;
pub use control_audit_store::SqliteControlAuditStore;
pub use merge_request_store::SqliteMergeRequestStore;
pub use pipeline_state_store::{SqlitePipelineHistoryStore, SqlitePipelineScheduleStore, SqlitePipelineStatusStore};
pub use raw_buffer_store::SqliteRawBufferStore;
pub use repository_store::SqliteRepositoryStore;
pub use sitemap_store::SqliteSitemapStore;
