//! End-to-end store tests against a real (temp-file) SQLite database, going
//! through the migration path exactly as the running service does.

use ghsync::infrastructure::github::cache::{CacheEntry, ConditionalCache};
use ghsync::infrastructure::repositories::schema::initialize_database;
use ghsync::infrastructure::repositories::{SqliteCheckpointStore, SqliteContributorStore, SqliteRepositoryStore};
use ghsync_domain::entities::contributor::Contributor;
use ghsync_domain::entities::repository::Repository;
use ghsync_domain::repositories::checkpoint_store::CheckpointStore;
use ghsync_domain::repositories::contributor_store::ContributorStore;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use tempfile::NamedTempFile;

async fn temp_pool() -> sqlx::SqlitePool {
    let temp = NamedTempFile::new().unwrap();
    let db_path = temp.path().to_str().unwrap().to_string();
    drop(temp);
    initialize_database(&format!("sqlite://{db_path}")).await.unwrap()
}

#[tokio::test]
async fn repository_upsert_is_idempotent_on_upstream_id() {
    let pool = temp_pool().await;
    let store = SqliteRepositoryStore::new(pool);

    let repo = Repository::new_minimal(100, "acme/widget".to_string(), 1);

    store.upsert(&repo, false).await.unwrap();
    let mut updated = repo.clone();
    updated.stars = 42;
    store.upsert(&updated, false).await.unwrap();

    let all = store.list_page(0, 10).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].stars, 42);
    assert_eq!(all[0].full_name, "acme/widget");
}

#[tokio::test]
async fn repository_upsert_does_not_clear_fields_with_nulls() {
    let pool = temp_pool().await;
    let store = SqliteRepositoryStore::new(pool);

    let mut repo = Repository::new_minimal(100, "acme/widget".to_string(), 1);
    repo.description = Some("a widget".to_string());
    store.upsert(&repo, false).await.unwrap();

    let mut refresh = repo.clone();
    refresh.description = None;
    refresh.stars = 99;
    store.upsert(&refresh, false).await.unwrap();

    let fetched = store.get_by_upstream_id(100).await.unwrap().unwrap();
    assert_eq!(fetched.description.as_deref(), Some("a widget"));
    assert_eq!(fetched.stars, 99);
}

#[tokio::test]
async fn placeholder_contributor_is_promoted_not_duplicated() {
    let pool = temp_pool().await;
    let store = SqliteContributorStore::new(pool);

    let placeholder = Contributor::new_minimal(500, None, true);
    store.upsert(&placeholder, false).await.unwrap();

    let mut enriched = placeholder.clone();
    enriched.username = Some("alice".to_string());
    enriched.is_placeholder = false;
    store.upsert(&enriched, false).await.unwrap();

    let found = store.get_by_upstream_id(500).await.unwrap().expect("contributor exists");
    assert_eq!(found.id, placeholder.id);
    assert_eq!(found.username.as_deref(), Some("alice"));
    assert!(!found.is_placeholder);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn conditional_cache_entry_survives_restart_via_store() {
    let pool = temp_pool().await;

    let cache = ConditionalCache::with_pool(16, pool.clone());
    cache
        .put(
            "/repos/acme/widget".to_string(),
            CacheEntry { etag: Some("\"abc123\"".to_string()), last_modified: None, body: serde_json::json!({"stars": 10}) },
        )
        .await;

    // Simulate a restart: a fresh cache over the same pool starts empty until hydrated.
    let restarted = ConditionalCache::with_pool(16, pool);
    assert!(restarted.get("/repos/acme/widget").is_none());
    restarted.hydrate().await;

    let entry = restarted.get("/repos/acme/widget").expect("entry persisted across restart");
    assert_eq!(entry.etag.as_deref(), Some("\"abc123\""));
    assert_eq!(entry.body["stars"], 10);
}

#[tokio::test]
async fn checkpoint_survives_restart_so_pagination_resumes() {
    let pool = temp_pool().await;
    let store = SqliteCheckpointStore::new(pool.clone());

    assert_eq!(store.load("fetch_pull_requests", "acme/widget").await.unwrap(), None);

    store.save("fetch_pull_requests", "acme/widget", "cursor-42").await.unwrap();
    store.save("fetch_pull_requests", "acme/widget", "cursor-99").await.unwrap();

    // A fresh store over the same pool, as after a restart, sees the latest cursor.
    let restarted = SqliteCheckpointStore::new(pool);
    assert_eq!(restarted.load("fetch_pull_requests", "acme/widget").await.unwrap().as_deref(), Some("cursor-99"));

    restarted.clear("fetch_pull_requests", "acme/widget").await.unwrap();
    assert_eq!(restarted.load("fetch_pull_requests", "acme/widget").await.unwrap(), None);
}
