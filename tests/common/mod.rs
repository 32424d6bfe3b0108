//! Common test utilities.
//!
//! A single wiremock server stands in for the GitHub API, the OAuth token
//! endpoint and the raw file host.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Response};
use axum::response::IntoResponse;
use axum_extra::extract::cookie::SignedCookieJar;
use gist_exposed::config::ServerConfig;
use gist_exposed::context::AppContext;
use gist_exposed::models::{Gist, User};
use gist_exposed::server::build_router;
use gist_exposed::session::Session;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub const USER_ID: i64 = 1000;
#[allow(dead_code)]
pub const ACCESS_TOKEN: &str = "XYZ";

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub ctx: AppContext,
    pub upstream: MockServer,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server with temporary storage and a seeded user.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let upstream = MockServer::start().await;

        let mut config = ServerConfig::for_data_directory(temp_dir.path());
        config.github.api_url = upstream.uri();
        config.github.token_url = format!("{}/login/oauth/access_token", upstream.uri());

        let ctx = AppContext::new(config)
            .await
            .expect("Failed to create app context");

        ctx.db
            .update(|tx| {
                tx.save_user(&User {
                    id: USER_ID,
                    username: "john".to_string(),
                    access_token: ACCESS_TOKEN.to_string(),
                })
            })
            .expect("Failed to seed user");

        let router = build_router(ctx.clone());

        Self {
            router,
            ctx,
            upstream,
            _temp_dir: temp_dir,
        }
    }

    /// Send a GET request with optional extra headers.
    pub async fn get(&self, uri: &str, headers: &[(&str, &str)]) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Cookie header value carrying a signed session.
    pub fn session_cookie(&self, session: &Session) -> String {
        let jar = session
            .save(SignedCookieJar::new(self.ctx.cookie_key.clone()))
            .unwrap();
        cookie_pairs(jar.into_response().headers())
    }

    /// Cookie header value for the seeded, logged-in user.
    pub fn logged_in(&self) -> String {
        self.session_cookie(&Session {
            user_id: Some(USER_ID),
            auth_state: None,
        })
    }

    /// Persist a gist record directly.
    pub fn save_gist(&self, gist: &Gist) {
        self.ctx.db.update(|tx| tx.save_gist(gist)).unwrap();
    }

    pub fn stored_gist(&self, id: &str) -> Option<Gist> {
        self.ctx.db.view(|tx| tx.gist(id)).unwrap()
    }

    pub fn stored_user(&self, id: i64) -> Option<User> {
        self.ctx.db.view(|tx| tx.user(id)).unwrap()
    }

    /// Serve a gist from the upstream API whose files live on the mock server.
    pub async fn mount_gist(&self, id: &str, description: &str, files: &[(&str, &str)]) {
        let mut listing = serde_json::Map::new();
        for (name, content) in files {
            let raw_path = format!("/raw/{}/{}", id, name);
            Mock::given(method("GET"))
                .and(path(raw_path.clone()))
                .respond_with(ResponseTemplate::new(200).set_body_string(*content))
                .mount(&self.upstream)
                .await;

            listing.insert(
                name.to_string(),
                json!({
                    "filename": name,
                    "size": content.len(),
                    "raw_url": format!("{}{}", self.upstream.uri(), raw_path),
                }),
            );
        }

        Mock::given(method("GET"))
            .and(path(format!("/gists/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "description": description,
                "public": true,
                "html_url": format!("https://gist.github.com/{}", id),
                "owner": {"id": USER_ID, "login": "john"},
                "files": listing,
                "created_at": "2014-06-01T12:00:00Z",
            })))
            .mount(&self.upstream)
            .await;
    }

    /// Number of gist metadata fetches made against the upstream API.
    pub async fn gist_fetches(&self, id: &str) -> usize {
        let target = format!("/gists/{}", id);
        self.upstream
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == target)
            .count()
    }
}

/// Turn `Set-Cookie` response headers into a `Cookie` request header value.
#[allow(dead_code)]
pub fn cookie_pairs(headers: &HeaderMap) -> String {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Location header of a redirect response.
#[allow(dead_code)]
pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Collect a response body into a string.
#[allow(dead_code)]
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
