/// On-disk gist file cache
use crate::error::{GistError, GistResult};
use std::path::PathBuf;
use tokio::fs;

/// Suffix of files still being downloaded; never served
pub const DOWNLOAD_SUFFIX: &str = ".download";

/// File cache rooted at a directory, one subdirectory per gist:
/// `{base}/{gist_id}/{filename}`
#[derive(Debug, Clone)]
pub struct FileCache {
    base_path: PathBuf,
}

impl FileCache {
    /// Create a new cache rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the file path for a gist file.
    ///
    /// Both parts must be single relative path segments.
    pub fn file_path(&self, gist_id: &str, filename: &str) -> GistResult<PathBuf> {
        if !is_safe_segment(gist_id) {
            return Err(GistError::InvalidPath(format!("invalid gist id: {:?}", gist_id)));
        }
        if !is_safe_segment(filename) {
            return Err(GistError::InvalidPath(format!("invalid filename: {:?}", filename)));
        }
        Ok(self.base_path.join(gist_id).join(filename))
    }

    /// Ensure the gist directory exists and return the file path
    pub async fn ensure_file_dir(&self, gist_id: &str, filename: &str) -> GistResult<PathBuf> {
        let path = self.file_path(gist_id, filename)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(path)
    }

    /// Open a cached file for reading
    pub async fn open(&self, gist_id: &str, filename: &str) -> GistResult<fs::File> {
        let path = self.file_path(gist_id, filename)?;
        if filename.ends_with(DOWNLOAD_SUFFIX) {
            return Err(GistError::NotFound(format!("{}/{}", gist_id, filename)));
        }

        match fs::File::open(&path).await {
            Ok(file) if file.metadata().await?.is_file() => Ok(file),
            Ok(_) => Err(GistError::NotFound(format!("{}/{}", gist_id, filename))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GistError::NotFound(format!("{}/{}", gist_id, filename)))
            }
            Err(e) => Err(GistError::Io(e)),
        }
    }

    /// Read a cached file fully into memory
    pub async fn read(&self, gist_id: &str, filename: &str) -> GistResult<Option<Vec<u8>>> {
        let path = self.file_path(gist_id, filename)?;

        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GistError::Io(e)),
        }
    }
}

/// A segment that cannot escape its parent directory
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '\0'])
}
