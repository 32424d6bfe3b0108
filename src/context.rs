/// Application context and dependency injection
use crate::{
    cache::FileCache,
    config::ServerConfig,
    db::Database,
    error::{GistError, GistResult},
    github::{GitHubApi, GitHubClient},
    mirror::MirrorEngine,
    oauth::{GitHubOAuth, TokenExchanger},
    session,
};
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: Arc<Database>,
    pub github: Arc<dyn GitHubClient>,
    pub oauth: Arc<dyn TokenExchanger>,
    pub mirror: Arc<MirrorEngine>,
    /// Session cookie signing key, derived from the database secret
    pub cookie_key: Key,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> GistResult<Self> {
        let github: Arc<dyn GitHubClient> = Arc::new(GitHubApi::new(
            config.github.api_url.clone(),
            config.http_timeout(),
        )?);
        let oauth: Arc<dyn TokenExchanger> = Arc::new(GitHubOAuth::new(
            config.github.clone(),
            config.http_timeout(),
        )?);

        Self::with_clients(config, github, oauth).await
    }

    /// Create a context with explicit upstream clients
    pub async fn with_clients(
        config: ServerConfig,
        github: Arc<dyn GitHubClient>,
        oauth: Arc<dyn TokenExchanger>,
    ) -> GistResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Open the database
        let db_path = config.storage.db_path.clone();
        let db = tokio::task::spawn_blocking(move || Database::open(&db_path))
            .await
            .map_err(|e| GistError::Internal(format!("Failed to open database: {}", e)))??;
        let db = Arc::new(db);

        let cookie_key = session::signing_key(db.secret())?;

        // Initialize mirror engine
        let mirror = Arc::new(MirrorEngine::new(
            db.clone(),
            github.clone(),
            FileCache::new(config.storage.cache_directory.clone()),
            config.http_timeout(),
        )?);

        Ok(Self {
            config: Arc::new(config),
            db,
            github,
            oauth,
            mirror,
            cookie_key,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> GistResult<()> {
        let dirs = vec![
            &config.storage.data_directory,
            &config.storage.cache_directory,
        ];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    GistError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Get the listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.config.service.hostname, self.config.service.port)
    }

    /// Public base URL without trailing slash
    pub fn public_url(&self) -> &str {
        self.config.embed.public_url.trim_end_matches('/')
    }
}

impl FromRef<AppContext> for Key {
    fn from_ref(ctx: &AppContext) -> Self {
        ctx.cookie_key.clone()
    }
}
