// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics
//!
//! Process-wide `prometheus` registry and the handful of series the Control
//! API exposes for scraping: request outcomes, rate-limit headroom, stage
//! throughput, run duration, and raw buffer depth.

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub requests_total: IntCounterVec,
    pub rate_limit_remaining: IntGaugeVec,
    pub stage_items_total: IntCounterVec,
    pub run_duration_seconds: HistogramVec,
    pub raw_buffer_depth: IntGauge,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            prometheus::Opts::new("ghsync_requests_total", "GitHub API requests by outcome"),
            &["outcome"],
        )
        .expect("metric names are static and valid");

        let rate_limit_remaining = IntGaugeVec::new(
            prometheus::Opts::new("ghsync_rate_limit_remaining", "Remaining GitHub rate-limit quota per token"),
            &["token_index"],
        )
        .expect("metric names are static and valid");

        let stage_items_total = IntCounterVec::new(
            prometheus::Opts::new("ghsync_stage_items_total", "Items processed by stage, by outcome"),
            &["stage", "outcome"],
        )
        .expect("metric names are static and valid");

        let run_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new("ghsync_run_duration_seconds", "Pipeline run duration"),
            &["pipeline"],
        )
        .expect("metric names are static and valid");

        let raw_buffer_depth =
            IntGauge::new("ghsync_raw_buffer_depth", "Current depth of the raw payload buffer")
                .expect("metric name is static and valid");

        registry.register(Box::new(requests_total.clone())).ok();
        registry.register(Box::new(rate_limit_remaining.clone())).ok();
        registry.register(Box::new(stage_items_total.clone())).ok();
        registry.register(Box::new(run_duration_seconds.clone())).ok();
        registry.register(Box::new(raw_buffer_depth.clone())).ok();

        Self {
            registry,
            requests_total,
            rate_limit_remaining,
            stage_items_total,
            run_duration_seconds,
            raw_buffer_depth,
        }
    }

    /// Renders the current snapshot in the Prometheus text exposition format,
    /// for the (out-of-scope) HTTP layer to serve on a scrape endpoint.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        encoder
            .encode(&self.registry.gather(), &mut buf)
            .expect("encoding a gathered metric family cannot fail");
        String::from_utf8(buf).expect("prometheus text encoding is always valid utf-8")
    }
}

pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_series() {
        METRICS.requests_total.with_label_values(&["success"]).inc();
        let snapshot = METRICS.render();
        assert!(snapshot.contains("ghsync_requests_total"));
    }
}
