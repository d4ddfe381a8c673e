// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Repositories
//!
//! Store port traits — one per entity — that define the contracts for
//! data persistence. Infrastructure provides the SQLite-backed
//! implementation (`ghsync::infrastructure::repositories`); tests can
//! substitute in-memory fakes. Domain logic depends only on these traits,
//! never on `sqlx` directly.

pub mod analytics_store;
pub mod checkpoint_store;
pub mod commit_store;
pub mod contributor_store;
pub mod control_audit_store;
pub mod merge_request_store;
pub mod pipeline_state_store;
pub mod raw_buffer_store;
pub mod repository_store;
pub mod sitemap_store;

pub use analytics_store::{ContributorRankingStore, ContributorRepositoryStore};
pub use checkpoint_store::CheckpointStore;
pub use commit_store::CommitStore;
pub use contributor_store::ContributorStore;
pub use control_audit_store::ControlAuditStore;
pub use merge_request_store::MergeRequestStore;
pub use pipeline_state_store::{PipelineHistoryStore, PipelineScheduleStore, PipelineStatusStore};
pub use raw_buffer_store::RawBufferStore;
pub use repository_store::RepositoryStore;
pub use sitemap_store::SitemapStore;
