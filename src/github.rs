/// GitHub API client
///
/// The rest of the service only sees the `GitHubClient` trait so the
/// upstream can be swapped for a mock in tests.
use crate::{
    error::{GistError, GistResult},
    models::{Gist, GistFile, User},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Capability interface for the upstream gist provider.
///
/// Every call is made on behalf of the user owning `token`.
#[async_trait]
pub trait GitHubClient: Send + Sync {
    /// Fetch the user that owns the access token
    async fn user(&self, token: &str) -> GistResult<User>;

    /// List the gists of the user that owns the access token
    async fn gists(&self, token: &str) -> GistResult<Vec<Gist>>;

    /// Fetch a single gist including per-file raw URLs.
    ///
    /// Returns `None` if GitHub does not know the gist.
    async fn gist(&self, token: &str, id: &str) -> GistResult<Option<Gist>>;
}

/// GitHub REST API client
#[derive(Clone)]
pub struct GitHubApi {
    http_client: Client,
    base_url: String,
}

impl GitHubApi {
    /// Create a new client against the given API base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> GistResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("gist-exposed/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| GistError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        token: &str,
        path: &str,
    ) -> GistResult<Option<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GitHub API request: GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(header::AUTHORIZATION, format!("token {}", token))
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| GistError::Upstream(format!("GET {}: {}", path, e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(GistError::Upstream(format!(
                "GET {}: GitHub returned {}",
                path,
                response.status()
            )));
        }

        let body = response
            .json()
            .await
            .map_err(|e| GistError::Upstream(format!("GET {}: invalid response: {}", path, e)))?;

        Ok(Some(body))
    }
}

#[async_trait]
impl GitHubClient for GitHubApi {
    async fn user(&self, token: &str) -> GistResult<User> {
        let user: ApiUser = self
            .get(token, "/user")
            .await?
            .ok_or_else(|| GistError::Upstream("get user: not found".to_string()))?;

        Ok(User {
            id: user.id,
            username: user.login,
            access_token: String::new(),
        })
    }

    async fn gists(&self, token: &str) -> GistResult<Vec<Gist>> {
        let gists: Vec<ApiGist> = self.get(token, "/gists").await?.unwrap_or_default();
        Ok(gists.into_iter().map(Gist::from).collect())
    }

    async fn gist(&self, token: &str, id: &str) -> GistResult<Option<Gist>> {
        let path = format!("/gists/{}", urlencoding::encode(id));
        let gist: Option<ApiGist> = self.get(token, &path).await?;
        Ok(gist.map(Gist::from))
    }
}

/// User as returned by the GitHub API
#[derive(Debug, Deserialize)]
struct ApiUser {
    id: i64,
    login: String,
}

/// Gist as returned by the GitHub API
#[derive(Debug, Deserialize)]
struct ApiGist {
    id: String,
    owner: Option<ApiUser>,
    description: Option<String>,
    #[serde(default)]
    public: bool,
    html_url: Option<String>,
    #[serde(default)]
    files: BTreeMap<String, ApiGistFile>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiGistFile {
    filename: Option<String>,
    #[serde(default)]
    size: u64,
    raw_url: Option<String>,
}

impl From<ApiGist> for Gist {
    fn from(item: ApiGist) -> Self {
        let files = item
            .files
            .into_iter()
            .map(|(name, file)| GistFile {
                size: file.size,
                filename: file.filename.unwrap_or(name),
                raw_url: file.raw_url.unwrap_or_default(),
            })
            .collect();

        Gist {
            id: item.id,
            user_id: 0,
            owner: item.owner.map(|o| o.login).unwrap_or_default(),
            description: item.description.unwrap_or_default(),
            public: item.public,
            url: item.html_url.unwrap_or_default(),
            files,
            created_at: item.created_at,
        }
    }
}
