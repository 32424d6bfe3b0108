/// Database layer for Gist Exposed
///
/// Wraps an embedded redb file with three partitions:
/// - `meta`: singleton values such as the cookie signing secret
/// - `users`: users keyed by their big-endian encoded id
/// - `gists`: gists keyed by id
use crate::models::{user_key, Gist, User};
use rand::{rngs::OsRng, RngCore};
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use tracing::{info, warn};

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum DbError {
        #[error("Database error: {0}")]
        Redb(#[from] redb::DatabaseError),

        #[error("Table error: {0}")]
        Table(#[from] redb::TableError),

        #[error("Storage error: {0}")]
        Storage(#[from] redb::StorageError),

        #[error("Transaction error: {0}")]
        Transaction(#[from] redb::TransactionError),

        #[error("Commit error: {0}")]
        Commit(#[from] redb::CommitError),

        #[error("Serialization error: {0}")]
        Serialization(#[from] serde_json::Error),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        /// Caller attempted to persist a record that violates a model invariant
        #[error("Invariant violated: {0}")]
        Invariant(&'static str),
    }

    pub type DbResult<T> = Result<T, DbError>;
}

pub use error::{DbError, DbResult};

const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const USERS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("users");
const GISTS: TableDefinition<&str, &[u8]> = TableDefinition::new("gists");

const SECRET_KEY: &str = "secret";

/// Length of the generated signing secret in bytes
pub const SECRET_LEN: usize = 64;

/// Application-level database.
///
/// `view` and `update` run inline on the calling task: every transaction is
/// a point lookup, a single-user prefix scan or a single-record write. Only
/// `open`, which may create the file, is moved to `spawn_blocking`.
pub struct Database {
    db: redb::Database,
    secret: Vec<u8>,
}

impl Database {
    /// Open (or create) the database file and initialize all partitions.
    ///
    /// A secret is generated on first open and reused afterwards.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = redb::Database::create(path)?;

        let write_txn = db.begin_write()?;
        let secret = {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(GISTS)?;
            let mut meta = write_txn.open_table(META)?;

            let existing = meta.get(SECRET_KEY)?.map(|guard| guard.value().to_vec());
            match existing {
                Some(secret) => secret,
                None => {
                    info!("Generating new session secret");
                    let mut secret = vec![0u8; SECRET_LEN];
                    OsRng.fill_bytes(&mut secret);
                    meta.insert(SECRET_KEY, secret.as_slice())?;
                    secret
                }
            }
        };
        write_txn.commit()?;

        Ok(Self { db, secret })
    }

    /// The 64-byte secret used to sign session cookies
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Execute a function in the context of a read-only transaction
    pub fn view<T>(&self, f: impl FnOnce(&ReadTx) -> DbResult<T>) -> DbResult<T> {
        let tx = ReadTx {
            txn: self.db.begin_read()?,
        };
        f(&tx)
    }

    /// Execute a function in the context of a writable transaction.
    ///
    /// The transaction commits if `f` returns `Ok` and is rolled back otherwise.
    pub fn update<T>(&self, f: impl FnOnce(&WriteTx) -> DbResult<T>) -> DbResult<T> {
        let tx = WriteTx {
            txn: self.db.begin_write()?,
        };

        match f(&tx) {
            Ok(value) => {
                tx.txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = tx.txn.abort() {
                    warn!("Failed to abort transaction: {}", abort_err);
                }
                Err(e)
            }
        }
    }
}

/// Read-only transaction
pub struct ReadTx {
    txn: redb::ReadTransaction,
}

impl ReadTx {
    /// Retrieve a gist by id
    pub fn gist(&self, id: &str) -> DbResult<Option<Gist>> {
        let table = self.txn.open_table(GISTS)?;
        let value = table.get(id)?;
        value
            .map(|guard| serde_json::from_slice(guard.value()).map_err(DbError::from))
            .transpose()
    }

    /// Retrieve all gists hosted by a user, newest first
    pub fn gists_by_user_id(&self, user_id: i64) -> DbResult<Vec<Gist>> {
        let table = self.txn.open_table(GISTS)?;

        let mut gists = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let gist: Gist = serde_json::from_slice(value.value())?;
            if gist.user_id == user_id {
                gists.push(gist);
            }
        }

        gists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(gists)
    }

    /// Retrieve a user by id
    pub fn user(&self, id: i64) -> DbResult<Option<User>> {
        let table = self.txn.open_table(USERS)?;
        let key = user_key(id);
        let value = table.get(&key[..])?;
        value
            .map(|guard| serde_json::from_slice(guard.value()).map_err(DbError::from))
            .transpose()
    }

    /// Secret as persisted in the meta partition
    pub fn secret(&self) -> DbResult<Option<Vec<u8>>> {
        let table = self.txn.open_table(META)?;
        let value = table.get(SECRET_KEY)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }
}

/// Writable transaction
pub struct WriteTx {
    txn: redb::WriteTransaction,
}

impl WriteTx {
    /// Store a gist, replacing any previous version
    pub fn save_gist(&self, gist: &Gist) -> DbResult<()> {
        if gist.id.is_empty() {
            return Err(DbError::Invariant("gist id required"));
        }

        let value = serde_json::to_vec(gist)?;
        let mut table = self.txn.open_table(GISTS)?;
        table.insert(gist.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Store a user, replacing any previous version
    pub fn save_user(&self, user: &User) -> DbResult<()> {
        if user.id == 0 {
            return Err(DbError::Invariant("user id required"));
        }

        let value = serde_json::to_vec(user)?;
        let key = user_key(user.id);
        let mut table = self.txn.open_table(USERS)?;
        table.insert(&key[..], value.as_slice())?;
        Ok(())
    }
}
