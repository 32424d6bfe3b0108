/// Persisted records: gists, their files and authorized users
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mirrored gist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gist {
    pub id: String,
    /// Local user that last refreshed this gist (0 if never mirrored)
    #[serde(default)]
    pub user_id: i64,
    /// GitHub login of the owner
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub public: bool,
    /// Canonical HTML URL on GitHub
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub files: Vec<GistFile>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Gist {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_id: 0,
            owner: String::new(),
            description: String::new(),
            public: false,
            url: String::new(),
            files: Vec::new(),
            created_at: None,
        }
    }

    /// Look up a file by name
    pub fn file(&self, filename: &str) -> Option<&GistFile> {
        self.files.iter().find(|f| f.filename == filename)
    }
}

/// A single file within a gist. Content lives in the file cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GistFile {
    pub size: u64,
    pub filename: String,
    #[serde(rename = "rawURL")]
    pub raw_url: String,
}

/// A GitHub-authorized user of the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub access_token: String,
}

/// Fixed-width big-endian encoding of a user id, so ids sort numerically in the store
pub fn user_key(id: i64) -> [u8; 8] {
    (id as u64).to_be_bytes()
}
