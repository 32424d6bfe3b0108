/// Configuration management for Gist Exposed
use crate::error::{GistError, GistResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub github: GitHubConfig,
    pub embed: EmbedConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Timeout applied to every outbound HTTP call, in seconds
    pub http_timeout_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    /// Embedded database file
    pub db_path: PathBuf,
    /// Root of the gist file cache
    pub cache_directory: PathBuf,
}

/// GitHub OAuth application and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_url: String,
    pub authorize_url: String,
    pub token_url: String,
    pub redirect_uri: Option<String>,
}

/// oEmbed provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Public base URL used in embed iframes
    pub public_url: String,
    pub provider_name: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> GistResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("GIST_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("GIST_PORT")
            .unwrap_or_else(|_| "40000".to_string())
            .parse()
            .map_err(|_| GistError::Config("Invalid port number".to_string()))?;
        let http_timeout_secs = env::var("GIST_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let data_directory: PathBuf = env::var("GIST_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let db_path = env::var("GIST_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("db"));
        let cache_directory = env::var("GIST_CACHE_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("gists"));

        let client_id = env::var("GITHUB_CLIENT_ID")
            .map_err(|_| GistError::Config("GitHub client id required: GITHUB_CLIENT_ID".to_string()))?;
        let client_secret = env::var("GITHUB_CLIENT_SECRET").map_err(|_| {
            GistError::Config("GitHub client secret required: GITHUB_CLIENT_SECRET".to_string())
        })?;
        let api_url =
            env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".to_string());
        let authorize_url = env::var("GITHUB_AUTHORIZE_URL")
            .unwrap_or_else(|_| "https://github.com/login/oauth/authorize".to_string());
        let token_url = env::var("GITHUB_TOKEN_URL")
            .unwrap_or_else(|_| "https://github.com/login/oauth/access_token".to_string());
        let redirect_uri = env::var("GITHUB_REDIRECT_URI").ok();

        let public_url =
            env::var("GIST_PUBLIC_URL").unwrap_or_else(|_| "https://gist.exposed".to_string());
        let provider_name =
            env::var("GIST_PROVIDER_NAME").unwrap_or_else(|_| "Gist Exposed!".to_string());

        let log_level = env::var("GIST_LOG")
            .unwrap_or_else(|_| "gist_exposed=debug,tower_http=debug".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                http_timeout_secs,
            },
            storage: StorageConfig {
                data_directory,
                db_path,
                cache_directory,
            },
            github: GitHubConfig {
                client_id,
                client_secret,
                api_url,
                authorize_url,
                token_url,
                redirect_uri,
            },
            embed: EmbedConfig {
                public_url,
                provider_name,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Configuration rooted at `data_directory` with placeholder credentials
    pub fn for_data_directory(data_directory: impl Into<PathBuf>) -> Self {
        let data_directory = data_directory.into();
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 40000,
                http_timeout_secs: 30,
            },
            storage: StorageConfig {
                db_path: data_directory.join("db"),
                cache_directory: data_directory.join("gists"),
                data_directory,
            },
            github: GitHubConfig {
                client_id: "ABC".to_string(),
                client_secret: "123".to_string(),
                api_url: "https://api.github.com".to_string(),
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                redirect_uri: None,
            },
            embed: EmbedConfig {
                public_url: "https://gist.exposed".to_string(),
                provider_name: "Gist Exposed!".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> GistResult<()> {
        if self.service.hostname.is_empty() {
            return Err(GistError::Config("Hostname cannot be empty".to_string()));
        }

        if self.github.client_id.is_empty() {
            return Err(GistError::Config("GitHub client id cannot be empty".to_string()));
        }

        if self.github.client_secret.is_empty() {
            return Err(GistError::Config(
                "GitHub client secret cannot be empty".to_string(),
            ));
        }

        if self.service.http_timeout_secs == 0 {
            return Err(GistError::Config(
                "HTTP timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.service.http_timeout_secs)
    }
}
