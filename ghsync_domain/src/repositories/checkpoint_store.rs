// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for per-stage pagination checkpoints, letting a fetch stage
//! resume from its last committed page after a restart instead of
//! re-walking every prior page.

use async_trait::async_trait;

use crate::error::IngestError;

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Last cursor recorded for `(stage_name, checkpoint_key)`, or `None` if
    /// the stage has never checkpointed this key.
    async fn load(&self, stage_name: &str, checkpoint_key: &str) -> Result<Option<String>, IngestError>;

    /// Upserts the cursor for `(stage_name, checkpoint_key)`.
    async fn save(&self, stage_name: &str, checkpoint_key: &str, cursor: &str) -> Result<(), IngestError>;

    /// Clears a checkpoint once its pagination has drained, so a later run
    /// starts that key fresh rather than reusing a stale cursor.
    async fn clear(&self, stage_name: &str, checkpoint_key: &str) -> Result<(), IngestError>;
}
