// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for the durable work queue (Raw Buffer).

use async_trait::async_trait;

use crate::entities::raw_payload::{RawPayload, RawPayloadKind};
use crate::error::IngestError;
use crate::value_objects::local_id::RawPayloadId;

#[async_trait]
pub trait RawBufferStore: Send + Sync {
    async fn enqueue(&self, payload: RawPayload) -> Result<RawPayloadId, IngestError>;

    /// Returns up to `limit` unprocessed rows in insertion order, stamped
    /// with `run_id` as their in-progress marker.
    async fn dequeue(&self, kind: RawPayloadKind, limit: i64, run_id: &str) -> Result<Vec<RawPayload>, IngestError>;

    /// Marks the row processed after its derived rows have committed.
    async fn mark_processed(&self, id: RawPayloadId) -> Result<(), IngestError>;

    /// Clears the in-progress marker without marking processed, unlocking the
    /// row for retry on the next dequeue ("on failure, unlocked for
    /// retry").
    async fn release(&self, id: RawPayloadId) -> Result<(), IngestError>;

    /// Count of unprocessed rows, for backpressure (high/low water marks).
    async fn depth(&self, kind: RawPayloadKind) -> Result<i64, IngestError>;
}
