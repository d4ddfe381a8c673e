// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for the Control API's mutating-operation audit log.

use async_trait::async_trait;

use crate::entities::control_audit::ControlAudit;
use crate::error::IngestError;

#[async_trait]
pub trait ControlAuditStore: Send + Sync {
    async fn record(&self, entry: ControlAudit) -> Result<(), IngestError>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<ControlAudit>, IngestError>;
}
