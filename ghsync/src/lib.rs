// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # GitHub Sync
//!
//! Core crate for the GitHub repository-data ingestion pipeline: fetches
//! repositories, contributors, pull requests and commits from the GitHub
//! REST API, stages them through a durable raw buffer, processes and enriches
//! them into the domain model, ranks contributors, and publishes a sitemap
//! index — all driven by a cron scheduler and a Control API.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Presentation Layer                       │
//! │  (Control API: trigger / status / schedule / history)       │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (Pipeline Executor, Scheduler, Sitemap Indexer)             │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer (ghsync_domain)              │
//! │  (Entities, Value Objects, Store/Client ports)               │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (GitHub client, SQLite stores, config, logging, metrics)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline stages
//!
//! Each run dequeues raw payloads and walks them through named stages:
//! repository → contributor → merge_request → commit → enrichment → ranking.
//! Stages run in DAG order with per-stage checkpoint cursors and a
//! configurable error policy (fail-fast, continue with threshold, or skip).
//!
//! ## Error handling
//!
//! [`ghsync_domain::IngestError`] categorizes every failure
//! (configuration, transient/permanent upstream, validation, store conflict,
//! cancellation) so the executor and scheduler can decide whether to retry,
//! skip, or abort a run.

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use ghsync_domain::{
    entities::{
        Commit, Contributor, ContributorRanking, ContributorRepository, ControlAudit, MergeRequest, PipelineHistory,
        PipelineSchedule, PipelineState, PipelineStatus, RawPayload, Repository, SitemapMetadata,
    },
    error::{ErrorCategory, IngestError},
    value_objects::{CronExpression, RankingWeights},
};
