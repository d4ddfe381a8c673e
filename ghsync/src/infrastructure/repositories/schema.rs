// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQLite schema helpers shared by repository implementations.
//!
//! Applies migrations on start-up so integration tests and services see a
//! consistent database.

use sqlx::migrate::MigrateDatabase;
use sqlx::{ Row, SqlitePool };
use tracing::{ debug, info };

use ghsync_domain::error::IngestError;

/// Tables and the columns on them that every store adapter assumes are
/// present. Checked once after migration so a broken or partially-applied
/// schema is a fatal startup error rather than a `sqlx::Error::ColumnNotFound`
/// surfacing from the first query that happens to touch the missing piece.
const CRITICAL_COLUMNS: &[(&str, &[&str])] = &[
    ("repositories", &["id", "upstream_id", "full_name", "stars", "is_enriched", "enrichment_attempts"]),
    ("contributors", &["id", "upstream_id", "username", "is_placeholder", "is_enriched", "enrichment_attempts"]),
    ("merge_requests", &["id", "repository_id", "author_id", "state", "complexity_score"]),
    ("commits", &["id", "sha", "repository_id", "filename", "complexity_score"]),
    ("contributor_repositories", &["contributor_id", "repository_id", "commit_count", "total_complexity"]),
    ("github_cache", &["path", "etag", "body"]),
    ("pipeline_checkpoints", &["stage_name", "checkpoint_key", "cursor"]),
    ("contributor_rankings", &["contributor_id", "total_score", "rank_position"]),
    ("raw_payloads", &["id", "kind", "body", "processed"]),
    ("pipeline_status", &["pipeline_type", "state", "is_running"]),
    ("pipeline_schedules", &["pipeline_type", "cron", "active"]),
    ("pipeline_history", &["run_id", "pipeline_type", "outcome"]),
    ("sitemap_metadata", &["entity_type", "current_page"]),
    ("control_audit", &["id", "actor", "action"]),
];

/// Post-migration verification gate: confirms every critical table and
/// column named in [`CRITICAL_COLUMNS`] actually exists, failing fast with
/// `IngestError::Schema` rather than letting the first affected query surface
/// a confusing `sqlx` error deep in a running pipeline.
pub async fn verify_critical_schema(pool: &SqlitePool) -> Result<(), IngestError> {
    for (table, columns) in CRITICAL_COLUMNS {
        let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
            .fetch_all(pool)
            .await
            .map_err(|e| IngestError::Schema(format!("reading schema for table '{table}': {e}")))?;

        if rows.is_empty() {
            return Err(IngestError::Schema(format!("critical table '{table}' is missing")));
        }

        let present: Vec<String> = rows
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<Result<_, _>>()
            .map_err(|e| IngestError::Schema(format!("reading columns for table '{table}': {e}")))?;

        for column in *columns {
            if !present.iter().any(|p| p == column) {
                return Err(IngestError::Schema(format!("critical column '{table}.{column}' is missing")));
            }
        }
    }

    debug!("critical schema verification passed");
    Ok(())
}

/// Runs pending migrations against the provided SQLite pool.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("Ensuring database schema is up to date");

    // Run migrations - sqlx will automatically track what's been applied
    sqlx::migrate!("../migrations").run(pool).await?;

    info!("Database schema is up to date");
    Ok(())
}

/// Creates a new SQLite database file if it doesn't exist
///
/// This function is useful for ensuring the database file exists before
/// attempting to connect. SQLitePool::connect() will fail if the file
/// doesn't exist unless using SqliteConnectOptions with create_if_missing.
///
/// # Arguments
///
/// * `database_url` - SQLite connection URL (e.g., "sqlite://path/to/db.db")
///
/// # Returns
///
/// * `Ok(())` - Database exists or was created successfully
/// * `Err(sqlx::Error)` - Failed to create database
///
/// # Example
///
/// ```rust,no_run
/// # use ghsync::infrastructure::repositories::schema;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// schema::create_database_if_missing("sqlite://./ghsync.db").await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_database_if_missing(database_url: &str) -> Result<(), sqlx::Error> {
    if !sqlx::Sqlite::database_exists(database_url).await? {
        debug!("Database does not exist, creating: {}", database_url);
        sqlx::Sqlite::create_database(database_url).await?;
        info!("Created new SQLite database: {}", database_url);
    } else {
        debug!("Database already exists: {}", database_url);
    }
    Ok(())
}

/// Initializes a new database with schema (convenience function)
///
/// This is a high-level function that combines database creation and
/// schema migration in one call. Perfect for application startup.
///
/// # Arguments
///
/// * `database_url` - SQLite connection URL
///
/// # Returns
///
/// * `Ok(SqlitePool)` - Connected pool with schema initialized
/// * `Err(sqlx::Error)` - Initialization failed
///
/// # Example
///
/// ```rust,no_run
/// # use ghsync::infrastructure::repositories::schema;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = schema::initialize_database("sqlite://./ghsync.db").await?;
/// // Database is ready to use!
/// # Ok(())
/// # }
/// ```
pub async fn initialize_database(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    // Create database if it doesn't exist
    create_database_if_missing(database_url).await?;

    // Connect to database
    let pool = SqlitePool::connect(database_url).await?;

    // Run migrations
    ensure_schema(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_create_database_if_missing() {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap();
        let db_url = format!("sqlite://{}", db_path);

        // Remove temp file so we can test creation
        drop(temp);

        // Should create the database
        create_database_if_missing(&db_url).await.unwrap();

        // Should succeed if already exists
        create_database_if_missing(&db_url).await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_database() {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap();
        let db_url = format!("sqlite://{}", db_path);
        drop(temp);

        // Initialize database with schema
        let pool = initialize_database(&db_url).await.unwrap();

        // Verify tables were created by checking for the repositories table
        let result: i32 = sqlx
            ::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='repositories'"
            )
            .fetch_one(&pool).await
            .unwrap();

        assert_eq!(result, 1, "repositories table should exist");
    }

    #[tokio::test]
    async fn test_ensure_schema_idempotent() {
        let temp = NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap();
        let db_url = format!("sqlite://{}", db_path);
        drop(temp);

        // Create database first so migrations can be tracked
        create_database_if_missing(&db_url).await.unwrap();
        let pool = SqlitePool::connect(&db_url).await.unwrap();

        // Run migrations twice - should be idempotent
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn verify_critical_schema_passes_after_migration() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        drop(temp);

        let pool = initialize_database(&db_url).await.unwrap();
        verify_critical_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn verify_critical_schema_fails_on_missing_table() {
        let temp = NamedTempFile::new().unwrap();
        let db_url = format!("sqlite://{}", temp.path().to_str().unwrap());
        drop(temp);

        create_database_if_missing(&db_url).await.unwrap();
        let pool = SqlitePool::connect(&db_url).await.unwrap();

        let err = verify_critical_schema(&pool).await.unwrap_err();
        assert!(matches!(err, IngestError::Schema(_)));
    }
}
