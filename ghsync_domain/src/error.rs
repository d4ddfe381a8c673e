// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error Taxonomy
//!
//! Typed errors for the ingestion pipeline, grouped so that the executor and
//! scheduler can decide propagation policy (recover locally vs. surface) without
//! string matching.

use thiserror::Error;

/// Coarse error category, used for metrics labeling and propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    UpstreamTransient,
    UpstreamPermanent,
    Validation,
    StoreConflict,
    Cancellation,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::UpstreamTransient => "upstream_transient",
            ErrorCategory::UpstreamPermanent => "upstream_permanent",
            ErrorCategory::Validation => "validation",
            ErrorCategory::StoreConflict => "store_conflict",
            ErrorCategory::Cancellation => "cancellation",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

/// Domain-wide error type.
///
/// Variants mirror the error taxonomy: fatal config/schema, upstream
/// transient/permanent, data validation, store conflict, cancellation, unknown.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Missing critical table/column, malformed cron, unparsable schedule.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Schema migration failed or the post-migration verification gate found a
    /// missing critical table/column.
    #[error("schema error: {0}")]
    Schema(String),

    /// Network error, 5xx, or secondary rate limit — retries have been
    /// exhausted by the time this reaches the caller.
    #[error("upstream transient error calling {resource}: {message}")]
    UpstreamTransient { resource: String, message: String },

    /// 404 / 410 / 401 — not retryable.
    #[error("upstream permanent error calling {resource}: {status} {message}")]
    UpstreamPermanent {
        resource: String,
        status: u16,
        message: String,
    },

    /// Payload missing a required field, or otherwise malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unique constraint / FK failure on the store. Callers typically treat
    /// this as "already processed" and continue.
    #[error("store conflict: {0}")]
    StoreConflict(String),

    /// A cooperative cancellation request was observed at a suspension point.
    #[error("operation cancelled")]
    Cancelled,

    /// Entity not found where existence was required.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Threshold of per-item errors in a batch exceeded the stage's configured
    /// error-policy threshold.
    #[error("error rate {observed:.1}% exceeded threshold {threshold:.1}% in stage {stage}")]
    ThresholdExceeded {
        stage: String,
        observed: f64,
        threshold: f64,
    },

    /// Stage dependency graph has a cycle — fatal at registration time.
    #[error("pipeline '{0}' has a cyclic stage dependency")]
    CyclicPipeline(String),

    /// Opaque store-layer failure not covered by a more specific variant.
    /// Infrastructure code maps `sqlx::Error` into this at the boundary so the
    /// domain crate never depends on the database driver.
    #[error("database error: {0}")]
    Database(String),

    /// Opaque transport-layer failure. Infrastructure code maps
    /// `reqwest::Error` into this at the boundary for the same reason.
    #[error("http error: {0}")]
    Http(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IngestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IngestError::Configuration(_) | IngestError::Schema(_) | IngestError::InvalidCron(_) => {
                ErrorCategory::Configuration
            }
            IngestError::UpstreamTransient { .. } => ErrorCategory::UpstreamTransient,
            IngestError::UpstreamPermanent { .. } => ErrorCategory::UpstreamPermanent,
            IngestError::Validation(_) => ErrorCategory::Validation,
            IngestError::StoreConflict(_) | IngestError::Database(_) => ErrorCategory::StoreConflict,
            IngestError::Cancelled => ErrorCategory::Cancellation,
            IngestError::NotFound { .. } => ErrorCategory::Validation,
            IngestError::ThresholdExceeded { .. } => ErrorCategory::Validation,
            IngestError::CyclicPipeline(_) => ErrorCategory::Configuration,
            IngestError::Http(_) => ErrorCategory::UpstreamTransient,
            IngestError::Json(_) | IngestError::Io(_) | IngestError::Internal(_) => ErrorCategory::Unknown,
        }
    }

    /// Per-item errors are recoverable locally (skip the item, record it);
    /// whole-stage errors must be surfaced to the executor.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Validation | ErrorCategory::StoreConflict | ErrorCategory::UpstreamPermanent
        )
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self.category(), ErrorCategory::Configuration)
    }
}
