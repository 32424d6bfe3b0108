/// Gist mirroring
///
/// Refreshing a gist fetches its current state from GitHub, downloads every
/// file into the file cache concurrently and only then overwrites the stored
/// metadata record. A failed download leaves the stored record untouched.
use crate::{
    cache::{FileCache, DOWNLOAD_SUFFIX},
    db::Database,
    error::{GistError, GistResult},
    github::GitHubClient,
    models::{Gist, GistFile},
};
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{fs, io::AsyncWriteExt, task::JoinSet};
use tracing::{debug, info, warn};

/// Orchestrates gist refreshes
pub struct MirrorEngine {
    db: Arc<Database>,
    github: Arc<dyn GitHubClient>,
    cache: FileCache,
    http_client: Client,
    /// One lock per gist id so refreshes of the same gist never interleave
    gist_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MirrorEngine {
    /// Create a new mirror engine
    pub fn new(
        db: Arc<Database>,
        github: Arc<dyn GitHubClient>,
        cache: FileCache,
        timeout: Duration,
    ) -> GistResult<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("gist-exposed/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| GistError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            db,
            github,
            cache,
            http_client,
            gist_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    /// Retrieve the latest gist files from GitHub and store them locally.
    pub async fn refresh_gist(&self, user_id: i64, gist_id: &str) -> GistResult<Gist> {
        let lock = self.gist_lock(gist_id)?;
        let result = {
            let _guard = lock.lock().await;
            self.refresh_locked(user_id, gist_id).await
        };
        self.release_gist_lock(gist_id, lock);
        result
    }

    async fn refresh_locked(&self, user_id: i64, gist_id: &str) -> GistResult<Gist> {
        // Resolve the user's access token
        let user = self
            .db
            .view(|tx| tx.user(user_id))?
            .ok_or(GistError::UserNotFound(user_id))?;

        // Retrieve gist data
        let mut gist = self
            .github
            .gist(&user.access_token, gist_id)
            .await
            .map_err(|e| GistError::Upstream(format!("gist: {}", e)))?
            .ok_or_else(|| GistError::Upstream(format!("gist not found: {}", gist_id)))?;

        debug!("Refreshing gist {} ({} files)", gist_id, gist.files.len());

        // Download all files before touching the stored record
        self.download_files(gist_id, &gist.files).await?;

        gist.user_id = user_id;
        if gist.id.is_empty() {
            gist.id = gist_id.to_string();
        }

        self.db.update(|tx| tx.save_gist(&gist))?;

        info!("Refreshed gist {} for user {}", gist_id, user_id);
        Ok(gist)
    }

    /// Download every file concurrently; the first failure cancels the rest.
    async fn download_files(&self, gist_id: &str, files: &[GistFile]) -> GistResult<()> {
        let mut tasks = JoinSet::new();

        for file in files {
            let path = self
                .cache
                .ensure_file_dir(gist_id, &file.filename)
                .await
                .map_err(|e| GistError::download(&file.raw_url, e))?;
            let client = self.http_client.clone();
            let url = file.raw_url.clone();

            tasks.spawn(async move { download(&client, &url, path).await });
        }

        while let Some(result) = tasks.join_next().await {
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => Err(GistError::Internal(format!("Download task failed: {}", e))),
            };

            if let Err(e) = outcome {
                warn!("Refresh of gist {} aborted: {}", gist_id, e);
                tasks.shutdown().await;
                return Err(e);
            }
        }

        Ok(())
    }

    fn gist_lock(&self, gist_id: &str) -> GistResult<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .gist_locks
            .lock()
            .map_err(|_| GistError::Internal("gist lock table poisoned".to_string()))?;

        Ok(locks.entry(gist_id.to_string()).or_default().clone())
    }

    /// Drop the table entry once no other refresh holds or waits on it
    fn release_gist_lock(&self, gist_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let Ok(mut locks) = self.gist_locks.lock() else {
            return;
        };
        // One reference in the table, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(gist_id);
        }
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.gist_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}

/// Retrieve a URL over HTTP GET and write the response body to `path`.
///
/// The body is written to a sibling temp file and renamed into place, so a
/// concurrent reader sees either the old or the new content.
async fn download(client: &Client, url: &str, path: PathBuf) -> GistResult<()> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GistError::download(url, format!("get: {}", e)))?;

    if !response.status().is_success() {
        return Err(GistError::download(
            url,
            format!("invalid HTTP status: {}", response.status().as_u16()),
        ));
    }

    let tmp_path = temp_path(&path);

    let written = async {
        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| GistError::download(url, format!("create: {}", e)))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GistError::download(url, format!("read body: {}", e)))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| GistError::download(url, format!("write: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| GistError::download(url, format!("write: {}", e)))?;
        drop(file);

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| GistError::download(url, format!("rename: {}", e)))
    }
    .await;

    if written.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path).await {
            debug!("remove {:?}: {}", tmp_path, e);
        }
    }

    written
}

/// Sibling path a download is staged at before the rename
fn temp_path(path: &Path) -> PathBuf {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(DOWNLOAD_SUFFIX);
    path.with_file_name(tmp_name)
}
