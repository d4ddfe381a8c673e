// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Entities
//!
//! The persisted record types: repositories, contributors, merge
//! requests, commits, the contributor/repository junction, ranking
//! snapshots, the raw payload buffer, and the scheduler's own bookkeeping
//! rows (status, schedule, history), plus the sitemap indexer's metadata and
//! the control API's audit log.

pub mod commit;
pub mod contributor;
pub mod contributor_ranking;
pub mod contributor_repository;
pub mod control_audit;
pub mod merge_request;
pub mod pipeline_history;
pub mod pipeline_schedule;
pub mod pipeline_status;
pub mod raw_payload;
pub mod repository;
pub mod sitemap_metadata;

pub use commit::{Commit, FileStatus};
pub use contributor::Contributor;
pub use contributor_ranking::ContributorRanking;
pub use contributor_repository::ContributorRepository;
pub use control_audit::ControlAudit;
pub use merge_request::{MergeRequest, MergeRequestState};
pub use pipeline_history::{PipelineHistory, RunOutcome};
pub use pipeline_schedule::PipelineSchedule;
pub use pipeline_status::{PipelineState, PipelineStatus};
pub use raw_payload::{RawPayload, RawPayloadKind};
pub use repository::{ActivityLevel, Repository};
pub use sitemap_metadata::{IndexableEntityType, SitemapMetadata};
