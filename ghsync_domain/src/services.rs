// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Services
//!
//! The GitHub Client port. Stage Processors are the consumers;
//! `ghsync::infrastructure::github` is the implementation.

pub mod github_client;

pub use github_client::{
    GithubClient, Page, PageCursor, UpstreamCommit, UpstreamCommitFile, UpstreamPullRequest, UpstreamRepository,
    UpstreamUser,
};
