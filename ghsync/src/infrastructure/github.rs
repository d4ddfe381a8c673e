// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Rate-limited, retrying, circuit-breaking GitHub REST client.
//!
//! [`client::GithubHttpClient`] is the only public entry point; the other
//! submodules are the mechanisms it composes (token pool, circuit breaker,
//! conditional-request cache, retry/backoff, pagination).

pub mod cache;
pub mod circuit_breaker;
pub mod client;
pub mod pagination;
pub mod retry;
pub mod token_pool;

pub use client::GithubHttpClient;
