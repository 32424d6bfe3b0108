/// GitHub OAuth2 authorization-code flow
use crate::{
    config::GitHubConfig,
    error::{GistError, GistResult},
};
use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use reqwest::{header, Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Generate a random, hex-encoded OAuth state value
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Turns authorization codes into access tokens
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// URL the user is sent to for authorization
    fn authorize_url(&self, state: &str) -> GistResult<String>;

    /// Exchange an authorization code for an access token
    async fn exchange(&self, code: &str) -> GistResult<String>;
}

/// Token exchange against GitHub's OAuth endpoints
pub struct GitHubOAuth {
    http_client: Client,
    config: GitHubConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl GitHubOAuth {
    pub fn new(config: GitHubConfig, timeout: Duration) -> GistResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GistError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl TokenExchanger for GitHubOAuth {
    fn authorize_url(&self, state: &str) -> GistResult<String> {
        let mut params = vec![
            ("client_id", self.config.client_id.as_str()),
            ("state", state),
        ];
        if let Some(redirect_uri) = &self.config.redirect_uri {
            params.push(("redirect_uri", redirect_uri.as_str()));
        }

        let url = Url::parse_with_params(&self.config.authorize_url, &params)
            .map_err(|e| GistError::Config(format!("Invalid authorize URL: {}", e)))?;
        Ok(url.to_string())
    }

    async fn exchange(&self, code: &str) -> GistResult<String> {
        debug!("Exchanging OAuth code at {}", self.config.token_url);

        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
        ];
        if let Some(redirect_uri) = &self.config.redirect_uri {
            form.push(("redirect_uri", redirect_uri.as_str()));
        }

        let response = self
            .http_client
            .post(&self.config.token_url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| GistError::Upstream(format!("token exchange: {}", e)))?;

        if !response.status().is_success() {
            return Err(GistError::Upstream(format!(
                "token exchange: GitHub returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| GistError::Upstream(format!("token exchange: invalid response: {}", e)))?;

        match token {
            TokenResponse {
                access_token: Some(access_token),
                ..
            } if !access_token.is_empty() => Ok(access_token),
            TokenResponse {
                error,
                error_description,
                ..
            } => Err(GistError::Upstream(format!(
                "token exchange: {} {}",
                error.unwrap_or_else(|| "no access token".to_string()),
                error_description.unwrap_or_default()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(token_url: String) -> GitHubConfig {
        GitHubConfig {
            client_id: "ABC".to_string(),
            client_secret: "123".to_string(),
            api_url: "https://api.github.com".to_string(),
            authorize_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url,
            redirect_uri: None,
        }
    }

    #[test]
    fn test_generate_state() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, generate_state());
    }

    #[test]
    fn test_authorize_url() {
        let oauth = GitHubOAuth::new(config("http://unused".into()), Duration::from_secs(5)).unwrap();
        let url = Url::parse(&oauth.authorize_url("abc123").unwrap()).unwrap();

        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("github.com"));
        assert_eq!(url.path(), "/login/oauth/authorize");
        let state = url.query_pairs().find(|(k, _)| k == "state").map(|(_, v)| v.into_owned());
        assert_eq!(state.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_string_contains("code=thecode"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "mytoken", "token_type": "bearer"})),
            )
            .mount(&server)
            .await;

        let oauth = GitHubOAuth::new(
            config(format!("{}/login/oauth/access_token", server.uri())),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(oauth.exchange("thecode").await.unwrap(), "mytoken");
    }

    #[tokio::test]
    async fn test_exchange_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "bad_verification_code"})),
            )
            .mount(&server)
            .await;

        let oauth = GitHubOAuth::new(config(server.uri()), Duration::from_secs(5)).unwrap();
        let err = oauth.exchange("stale").await.unwrap_err();
        assert!(err.to_string().contains("bad_verification_code"));
    }
}
