//! Exercises `GithubHttpClient` against a mock GitHub API.

use ghsync::infrastructure::github::GithubHttpClient;
use ghsync_domain::services::github_client::{GithubClient, PageCursor};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetches_and_maps_a_repository() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ratelimit-remaining", "4999")
                .insert_header("x-ratelimit-reset", "9999999999")
                .set_body_json(json!({
                    "id": 100,
                    "full_name": "acme/widget",
                    "description": "a widget",
                    "html_url": "https://github.com/acme/widget",
                    "stargazers_count": 42,
                    "forks_count": 3,
                    "watchers_count": 42,
                    "open_issues_count": 1,
                    "size": 128,
                    "language": "Rust",
                    "license": { "key": "mit" },
                    "default_branch": "main",
                    "fork": false,
                    "archived": false,
                    "updated_at": "2026-01-01T00:00:00Z",
                    "owner": { "id": 200, "login": "acme" },
                })),
        )
        .mount(&server)
        .await;

    let client = GithubHttpClient::with_base_url(vec!["tok".to_string()], server.uri());
    let repo = client.get_repository("acme", "widget").await.unwrap();

    assert_eq!(repo.upstream_id, 100);
    assert_eq!(repo.full_name, "acme/widget");
    assert_eq!(repo.stars, 42);
    assert_eq!(repo.owner_upstream_id, Some(200));
}

#[tokio::test]
async fn retries_once_after_a_429_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 500,
            "login": "alice",
            "name": "Alice",
            "avatar_url": null,
            "bio": null,
            "company": null,
            "blog": null,
            "location": null,
            "twitter_username": null,
            "followers": 10,
            "public_repos": 4,
        })))
        .mount(&server)
        .await;

    let client = GithubHttpClient::with_base_url(vec!["tok".to_string()], server.uri());
    let user = client.get_user("alice").await.unwrap();

    assert_eq!(user.upstream_id, 500);
    assert_eq!(user.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn a_404_is_permanent_and_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = GithubHttpClient::with_base_url(vec!["tok".to_string()], server.uri());
    let err = client.get_repository("acme", "ghost").await.unwrap_err();
    assert!(matches!(err, ghsync_domain::error::IngestError::UpstreamPermanent { status: 404, .. }));
}

#[tokio::test]
async fn conditional_request_serves_cached_body_on_304() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("etag", "\"v1\"")
                .set_body_json(json!({
                    "id": 100, "full_name": "acme/widget", "description": null, "html_url": null,
                    "stargazers_count": 1, "forks_count": 0, "watchers_count": 1, "open_issues_count": 0,
                    "size": 1, "language": null, "license": null, "default_branch": "main",
                    "fork": false, "archived": false, "updated_at": null, "owner": null,
                })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget"))
        .and(header("if-none-match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let client = GithubHttpClient::with_base_url(vec!["tok".to_string()], server.uri());
    let first = client.get_repository("acme", "widget").await.unwrap();
    let second = client.get_repository("acme", "widget").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn list_pull_requests_follows_link_header_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/pulls"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("link", format!("<{}/next-page>; rel=\"next\"", server.uri()).as_str()).set_body_json(
                json!([]),
            ),
        )
        .mount(&server)
        .await;

    let client = GithubHttpClient::with_base_url(vec!["tok".to_string()], server.uri());
    let page = client
        .list_repository_pull_requests("acme", "widget", PageCursor(None))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.next.0, Some(format!("{}/next-page", server.uri())));
}
