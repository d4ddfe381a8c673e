// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Token pool for GitHub's per-token rate limit.
//!
//! Each configured token tracks its own remaining quota and reset time, taken
//! from the `x-ratelimit-remaining` / `x-ratelimit-reset` response headers.
//! [`TokenPool::select`] always hands out the token with the highest known
//! remaining quota; a token that draws a 401 is quarantined for
//! [`QUARANTINE_COOLDOWN`] and rehabilitated once that elapses, the same way
//! a rate-limited token rehabilitates at its `reset_at`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::infrastructure::metrics::METRICS;

/// How long a token stays quarantined after a 401 before it is tried again.
const QUARANTINE_COOLDOWN: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
struct TokenState {
    token: String,
    remaining: i64,
    reset_at: Option<DateTime<Utc>>,
    quarantined: bool,
    quarantined_until: Option<DateTime<Utc>>,
}

/// Ordered collection of GitHub tokens sharing the rate-limit bookkeeping.
pub struct TokenPool {
    slots: Mutex<Vec<TokenState>>,
}

impl TokenPool {
    pub fn new(tokens: Vec<String>) -> Self {
        let slots = tokens
            .into_iter()
            .map(|token| TokenState { token, remaining: i64::MAX, reset_at: None, quarantined: false, quarantined_until: None })
            .collect();
        Self { slots: Mutex::new(slots) }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Picks the non-quarantined token with the most remaining quota. Tokens
    /// whose reset time has passed are rehabilitated first. Returns `None`
    /// only when every token is quarantined or exhausted until its reset.
    pub fn select(&self) -> Option<(usize, String)> {
        let mut slots = self.slots.lock();
        let now = Utc::now();
        for slot in slots.iter_mut() {
            if let Some(reset_at) = slot.reset_at {
                if now >= reset_at {
                    slot.remaining = i64::MAX;
                    slot.reset_at = None;
                }
            }
            if let Some(until) = slot.quarantined_until {
                if now >= until {
                    slot.quarantined = false;
                    slot.quarantined_until = None;
                }
            }
        }
        slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.quarantined && s.remaining > 0)
            .max_by_key(|(_, s)| s.remaining)
            .map(|(i, s)| (i, s.token.clone()))
    }

    /// Earliest reset time across all quarantined-by-exhaustion tokens, used
    /// to compute how long to suspend the caller when no token is usable.
    pub fn earliest_reset(&self) -> Option<DateTime<Utc>> {
        self.slots
            .lock()
            .iter()
            .filter(|s| !s.quarantined)
            .filter_map(|s| s.reset_at)
            .min()
    }

    pub fn record_headers(&self, index: usize, remaining: Option<i64>, reset_at: Option<DateTime<Utc>>) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(index) {
            if let Some(remaining) = remaining {
                slot.remaining = remaining;
            }
            if reset_at.is_some() {
                slot.reset_at = reset_at;
            }
            METRICS.rate_limit_remaining.with_label_values(&[&index.to_string()]).set(slot.remaining);
        }
    }

    pub fn quarantine(&self, index: usize) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(index) {
            slot.quarantined = true;
            slot.quarantined_until = Some(Utc::now() + chrono::Duration::from_std(QUARANTINE_COOLDOWN).unwrap());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_token_with_most_remaining_quota() {
        let pool = TokenPool::new(vec!["a".into(), "b".into()]);
        pool.record_headers(0, Some(10), None);
        pool.record_headers(1, Some(5000), None);
        let (chosen, _) = pool.select().unwrap();
        assert_eq!(chosen, 1);
    }

    #[test]
    fn quarantined_token_is_never_selected() {
        let pool = TokenPool::new(vec!["only".into()]);
        let (idx, _) = pool.select().unwrap();
        pool.quarantine(idx);
        assert!(pool.select().is_none());
    }

    #[test]
    fn quarantine_is_lifted_once_the_cooldown_has_passed() {
        let pool = TokenPool::new(vec!["only".into()]);
        let (idx, _) = pool.select().unwrap();
        pool.quarantine(idx);
        assert!(pool.select().is_none());

        // Backdate the cooldown rather than sleeping the test.
        pool.slots.lock()[idx].quarantined_until = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(pool.select().is_some());
    }
}
