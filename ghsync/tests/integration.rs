//! Integration tests for the `ghsync` core crate.

#[path = "integration/github_client_test.rs"]
mod github_client_test;

#[path = "integration/sqlite_store_test.rs"]
mod sqlite_store_test;
