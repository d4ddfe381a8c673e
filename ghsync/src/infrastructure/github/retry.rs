// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Exponential backoff with jitter for upstream-transient failures.
//!
//! 4xx responses other than 429 are permanent and must not be retried; the
//! caller is responsible for only invoking [`retry_with_backoff`] around a
//! closure that already classifies its own errors via [`IngestError`]'s
//! category.

use std::time::Duration;

use rand::Rng;
use tracing::warn;

use ghsync_domain::error::{ErrorCategory, IngestError};

const BASE_DELAY: Duration = Duration::from_millis(200);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Retries `operation` up to `max_retries` additional times when it returns
/// an [`ErrorCategory::UpstreamTransient`] error, doubling the delay each
/// time and adding up to 50% jitter. An explicit `retry_after` hint (from a
/// 429's `Retry-After` header) overrides the computed delay for that attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    resource: &str,
    max_retries: u32,
    mut operation: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, (IngestError, Option<Duration>)>>,
{
    let mut delay = BASE_DELAY;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(value) => return Ok(value),
            Err((err, retry_after)) => {
                let retryable = err.category() == ErrorCategory::UpstreamTransient;
                if !retryable || attempt == max_retries {
                    return Err(err);
                }

                let wait = retry_after.unwrap_or_else(|| jittered(delay));
                warn!(resource, attempt, ?wait, "retrying GitHub request after transient error");
                tokio::time::sleep(wait).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }

    unreachable!("loop always returns before exhausting attempts")
}

fn jittered(delay: Duration) -> Duration {
    let jitter_ms = rand::rng().random_range(0..=(delay.as_millis() as u64 / 2).max(1));
    delay + Duration::from_millis(jitter_ms)
}
