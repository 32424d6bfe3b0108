//! Integration tests for gist serving and the refresh policy.

mod common;

use axum::http::{header, StatusCode};
use common::{body_string, location, TestServer, USER_ID};

const PAGE: &str = "<html><body>hello</body></html>";
const SCRIPT: &str = "alert(100);";

async fn server_with_gist() -> TestServer {
    let server = TestServer::new().await;
    server
        .mount_gist("xxx", "my gist", &[("index.html", PAGE), ("app.js", SCRIPT)])
        .await;
    server
}

#[tokio::test]
async fn test_logged_in_page_load_mirrors_gist() {
    let server = server_with_gist().await;
    let cookie = server.logged_in();

    let response = server.get("/john/xxx/", &[("cookie", &cookie)]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(body_string(response).await, PAGE);

    assert_eq!(server.gist_fetches("xxx").await, 1);

    let gist = server.stored_gist("xxx").unwrap();
    assert_eq!(gist.user_id, USER_ID);
    assert_eq!(gist.description, "my gist");
    assert_eq!(gist.files.len(), 2);

    // Sub-resources come from the cache without another refresh
    let response = server.get("/xxx/app.js", &[("cookie", &cookie)]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .contains("javascript"));
    assert_eq!(body_string(response).await, SCRIPT);
    assert_eq!(server.gist_fetches("xxx").await, 1);
}

#[tokio::test]
async fn test_same_host_referrer_refreshes() {
    let server = server_with_gist().await;
    let cookie = server.logged_in();

    let response = server
        .get(
            "/xxx/index.html",
            &[
                ("cookie", &cookie),
                ("host", "gist.exposed"),
                ("referer", "https://gist.exposed/_/dashboard"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.gist_fetches("xxx").await, 1);
}

#[tokio::test]
async fn test_foreign_referrer_serves_cache() {
    let server = server_with_gist().await;
    let cookie = server.logged_in();

    // Prime the cache
    let response = server.get("/xxx/", &[("cookie", &cookie)]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(server.gist_fetches("xxx").await, 1);

    // Embedded on another site
    let response = server
        .get(
            "/xxx/",
            &[
                ("cookie", &cookie),
                ("host", "gist.exposed"),
                ("referer", "https://blog.example.com/post"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, PAGE);
    assert_eq!(server.gist_fetches("xxx").await, 1);
}

#[tokio::test]
async fn test_asset_request_does_not_refresh() {
    let server = server_with_gist().await;
    let cookie = server.logged_in();

    // Never mirrored, so nothing to serve
    let response = server.get("/xxx/app.js", &[("cookie", &cookie)]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.gist_fetches("xxx").await, 0);
}

#[tokio::test]
async fn test_anonymous_request_does_not_refresh() {
    let server = server_with_gist().await;

    let response = server.get("/xxx/", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.gist_fetches("xxx").await, 0);
}

#[tokio::test]
async fn test_anonymous_request_serves_cached_gist() {
    let server = server_with_gist().await;
    let cookie = server.logged_in();
    server.get("/xxx/", &[("cookie", &cookie)]).await;

    let response = server.get("/john/xxx/index.html", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, PAGE);
    assert_eq!(server.gist_fetches("xxx").await, 1);
}

#[tokio::test]
async fn test_refresh_failure_is_server_error() {
    let server = TestServer::new().await;
    let cookie = server.logged_in();

    // Upstream knows nothing about this gist
    let response = server.get("/missing/", &[("cookie", &cookie)]).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(server.stored_gist("missing").is_none());
}

#[tokio::test]
async fn test_missing_file_not_found() {
    let server = server_with_gist().await;
    let cookie = server.logged_in();
    server.get("/xxx/", &[("cookie", &cookie)]).await;

    let response = server.get("/xxx/nope.css", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_canonical_paths_redirect() {
    let server = TestServer::new().await;

    let response = server.get("/abc123", &[]).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/abc123/");

    let response = server.get("/john/abc123?x=1", &[]).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/john/abc123/?x=1");
}

#[tokio::test]
async fn test_unroutable_paths_not_found() {
    let server = TestServer::new().await;

    let response = server.get("/john/abc123/sub/index.html", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server.get("/_/unknown", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_leading_segment_never_redirects_off_site() {
    let server = TestServer::new().await;

    for path in ["//evil%2Ecom", "//localhost", "//2130706433", "//evil.com/abc123"] {
        let response = server.get(path, &[]).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path: {}", path);
        assert!(response.headers().get(header::LOCATION).is_none());
    }
}
