// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Bounded LRU cache of conditional-request validators (`ETag` /
//! `Last-Modified`) and the last-known-good body for each resource, so a 304
//! response can be served from cache without re-parsing upstream JSON.
//!
//! Write-through to the `github_cache` table when constructed with a pool, so
//! a restart hydrates the in-memory LRU from what was persisted last run
//! instead of re-fetching every resource unconditionally.

use std::num::NonZeroUsize;

use chrono::Utc;
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: Value,
}

pub struct ConditionalCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    pool: Option<SqlitePool>,
}

impl ConditionalCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { entries: Mutex::new(LruCache::new(capacity)), pool: None }
    }

    pub fn with_pool(capacity: usize, pool: SqlitePool) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self { entries: Mutex::new(LruCache::new(capacity)), pool: Some(pool) }
    }

    /// Loads every persisted entry into the in-memory LRU. Called once at
    /// start-up; a failure here is logged and otherwise ignored since the
    /// cache is an optimization, not a correctness requirement.
    pub async fn hydrate(&self) {
        let Some(pool) = &self.pool else { return };
        let rows = match sqlx::query("SELECT path, etag, last_modified, body FROM github_cache").fetch_all(pool).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "failed to hydrate conditional-request cache from store");
                return;
            }
        };

        let mut entries = self.entries.lock();
        for row in rows {
            let (Ok(path), Ok(body)) = (row.try_get::<String, _>("path"), row.try_get::<String, _>("body")) else {
                continue;
            };
            let Ok(body) = serde_json::from_str(&body) else { continue };
            entries.put(
                path,
                CacheEntry {
                    etag: row.try_get("etag").ok(),
                    last_modified: row.try_get("last_modified").ok(),
                    body,
                },
            );
        }
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub async fn put(&self, key: String, entry: CacheEntry) {
        if let Some(pool) = &self.pool {
            let body = entry.body.to_string();
            let result = sqlx::query(
                "INSERT INTO github_cache (path, etag, last_modified, body, cached_at) VALUES (?,?,?,?,?)
                 ON CONFLICT(path) DO UPDATE SET etag = excluded.etag, last_modified = excluded.last_modified, body = excluded.body, cached_at = excluded.cached_at",
            )
            .bind(&key)
            .bind(&entry.etag)
            .bind(&entry.last_modified)
            .bind(&body)
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await;

            if let Err(e) = result {
                warn!(error = %e, path = %key, "failed to persist conditional-request cache entry");
            }
        }

        self.entries.lock().put(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn evicts_least_recently_used_entry() {
        let cache = ConditionalCache::new(1);
        cache.put("a".into(), CacheEntry { etag: Some("1".into()), last_modified: None, body: Value::Null }).await;
        cache.put("b".into(), CacheEntry { etag: Some("2".into()), last_modified: None, body: Value::Null }).await;
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
    }
}
