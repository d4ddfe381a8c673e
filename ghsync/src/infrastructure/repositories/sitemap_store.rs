// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite implementation of `SitemapStore`.

use async_trait::async_trait;
use ghsync_domain::entities::sitemap_metadata::{IndexableEntityType, SitemapMetadata};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::sitemap_store::SitemapStore;
use sqlx::{Row, SqlitePool};

fn db_err(e: sqlx::Error) -> IngestError {
    IngestError::Database(e.to_string())
}

fn entity_type_str(entity_type: IndexableEntityType) -> &'static str {
    match entity_type {
        IndexableEntityType::Repository => "repository",
        IndexableEntityType::Contributor => "contributor",
        IndexableEntityType::MergeRequest => "merge_request",
    }
}

fn entity_type_from_str(s: &str) -> IndexableEntityType {
    match s {
        "contributor" => IndexableEntityType::Contributor,
        "merge_request" => IndexableEntityType::MergeRequest,
        _ => IndexableEntityType::Repository,
    }
}

pub struct SqliteSitemapStore {
    pool: SqlitePool,
}

impl SqliteSitemapStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SitemapStore for SqliteSitemapStore {
    async fn get(&self, entity_type: IndexableEntityType) -> Result<Option<SitemapMetadata>, IngestError> {
        let row = sqlx::query("SELECT * FROM sitemap_metadata WHERE entity_type = ?")
            .bind(entity_type_str(entity_type))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|row| {
            let entity_type: String = row.try_get("entity_type").map_err(db_err)?;
            Ok(SitemapMetadata {
                entity_type: entity_type_from_str(&entity_type),
                current_page: row.try_get("current_page").map_err(db_err)?,
                url_count: row.try_get("url_count").map_err(db_err)?,
                last_updated_at: row.try_get("last_updated_at").map_err(db_err)?,
            })
        })
        .transpose()
    }

    async fn upsert(&self, metadata: &SitemapMetadata) -> Result<(), IngestError> {
        sqlx::query(
            r#"
            INSERT INTO sitemap_metadata (entity_type, current_page, url_count, last_updated_at)
            VALUES (?,?,?,?)
            ON CONFLICT(entity_type) DO UPDATE SET
                current_page = excluded.current_page,
                url_count = excluded.url_count,
                last_updated_at = excluded.last_updated_at
            "#,
        )
        .bind(entity_type_str(metadata.entity_type))
        .bind(metadata.current_page)
        .bind(metadata.url_count)
        .bind(metadata.last_updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
