// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Three-state circuit breaker protecting the GitHub client from hammering an
//! upstream that is already failing.
//!
//! Tracks a rolling window of recent outcomes. When the error rate over the
//! window crosses [`CircuitBreaker::threshold`] the breaker opens and every
//! call is rejected locally until the cooldown elapses, at which point a
//! single half-open probe is allowed through; its outcome decides whether the
//! breaker closes again or reopens for another cooldown.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use ghsync_domain::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
}

pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    window_size: usize,
    error_rate_threshold: f64,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(window_size: usize, error_rate_threshold: f64, cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner { state: State::Closed, window: VecDeque::with_capacity(window_size), opened_at: None }),
            window_size,
            error_rate_threshold,
            cooldown,
        }
    }

    /// Returns `Ok(())` if a call may proceed, `Err` if the breaker is open
    /// and the cooldown has not yet elapsed.
    pub fn check(&self, resource: &str) -> Result<(), IngestError> {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => Ok(()),
            State::Open => {
                let elapsed = inner.opened_at.map(|at| at.elapsed()).unwrap_or_default();
                if elapsed >= self.cooldown {
                    inner.state = State::HalfOpen;
                    Ok(())
                } else {
                    Err(IngestError::UpstreamTransient {
                        resource: resource.to_string(),
                        message: "circuit breaker open".to_string(),
                    })
                }
            }
            State::HalfOpen => Ok(()),
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        push(&mut inner.window, self.window_size, true);
        if inner.state == State::HalfOpen {
            inner.state = State::Closed;
            inner.opened_at = None;
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        push(&mut inner.window, self.window_size, false);

        if inner.state == State::HalfOpen {
            inner.state = State::Open;
            inner.opened_at = Some(Instant::now());
            return;
        }

        if inner.window.len() >= self.window_size {
            let errors = inner.window.iter().filter(|ok| !**ok).count();
            let rate = errors as f64 / inner.window.len() as f64;
            if rate >= self.error_rate_threshold {
                inner.state = State::Open;
                inner.opened_at = Some(Instant::now());
            }
        }
    }
}

fn push(window: &mut VecDeque<bool>, capacity: usize, ok: bool) {
    if window.len() == capacity {
        window.pop_front();
    }
    window.push_back(ok);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_error_rate_crosses_threshold() {
        let breaker = CircuitBreaker::new(4, 0.5, Duration::from_secs(30));
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert!(breaker.check("repos/acme/widget").is_err());
    }

    #[test]
    fn stays_closed_below_threshold() {
        let breaker = CircuitBreaker::new(4, 0.5, Duration::from_secs(30));
        breaker.record_failure();
        breaker.record_success();
        breaker.record_success();
        breaker.record_success();
        assert!(breaker.check("repos/acme/widget").is_ok());
    }

    #[test]
    fn half_open_failure_reopens_immediately() {
        let breaker = CircuitBreaker::new(2, 0.5, Duration::from_millis(1));
        breaker.record_failure();
        breaker.record_failure();
        std::thread::sleep(Duration::from_millis(5));
        assert!(breaker.check("x").is_ok());
        breaker.record_failure();
        assert!(breaker.check("x").is_err());
    }
}
