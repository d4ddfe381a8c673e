// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Store port for `SitemapMetadata`.

use async_trait::async_trait;

use crate::entities::sitemap_metadata::{IndexableEntityType, SitemapMetadata};
use crate::error::IngestError;

#[async_trait]
pub trait SitemapStore: Send + Sync {
    async fn get(&self, entity_type: IndexableEntityType) -> Result<Option<SitemapMetadata>, IngestError>;

    async fn upsert(&self, metadata: &SitemapMetadata) -> Result<(), IngestError>;
}
