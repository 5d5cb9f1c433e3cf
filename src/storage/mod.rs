//! Persistence layer.
//!
//! Every record is an independent JSON file under the storage root:
//! one balance and one win-count file per participant, plus the shared
//! guess session. There is no caching; each call goes to disk.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::StorageConfig;
use crate::types::{BalanceRecord, GuessSession, WinCountRecord};

pub const DEFAULT_BALANCE_SUFFIX: &str = "_balance.json";
pub const DEFAULT_WINS_SUFFIX: &str = "_total_wins.json";
pub const DEFAULT_GUESSES_FILE: &str = "current_guesses.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Record is empty: {}", .path.display())]
    Empty { path: PathBuf },

    #[error("Record is not valid JSON ({}): {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StoreError::Empty { .. })
    }
}

/// Keyed access to the persisted records.
///
/// Reads fail with `NotFound` when the record has never been written.
/// Writes fully overwrite prior content.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn read_balance(&self, name: &str) -> Result<BalanceRecord, StoreError>;

    async fn write_balance(&self, name: &str, record: BalanceRecord) -> Result<(), StoreError>;

    async fn read_win_count(&self, name: &str) -> Result<WinCountRecord, StoreError>;

    async fn write_win_count(&self, name: &str, record: WinCountRecord) -> Result<(), StoreError>;

    async fn read_guess_session(&self) -> Result<GuessSession, StoreError>;

    async fn write_guess_session(&self, session: &GuessSession) -> Result<(), StoreError>;

    /// Create the storage location if it does not exist yet.
    async fn prepare(&self) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    balance_suffix: String,
    wins_suffix: String,
    guesses_file: String,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            balance_suffix: DEFAULT_BALANCE_SUFFIX.to_string(),
            wins_suffix: DEFAULT_WINS_SUFFIX.to_string(),
            guesses_file: DEFAULT_GUESSES_FILE.to_string(),
        }
    }

    pub fn from_config(cfg: &StorageConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            balance_suffix: cfg.balance_suffix.clone(),
            wins_suffix: cfg.wins_suffix.clone(),
            guesses_file: cfg.guesses_file.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn balance_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{}", self.balance_suffix))
    }

    pub fn wins_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{}", self.wins_suffix))
    }

    pub fn guesses_path(&self) -> PathBuf {
        self.root.join(&self.guesses_file)
    }
}

/// Read and parse a record. A file holding JSON `null` is reported as `Empty`.
async fn read_json<T: DeserializeOwned>(path: PathBuf) -> Result<T, StoreError> {
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound { path }),
        Err(source) => return Err(StoreError::Io { path, source }),
    };

    let parsed: Option<T> = match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(source) => return Err(StoreError::Corrupt { path, source }),
    };

    parsed.ok_or(StoreError::Empty { path })
}

async fn write_json<T: Serialize + ?Sized>(path: PathBuf, value: &T) -> Result<(), StoreError> {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(source) => return Err(StoreError::Corrupt { path, source }),
    };

    if let Err(source) = tokio::fs::write(&path, json).await {
        return Err(StoreError::Io { path, source });
    }

    debug!(path = %path.display(), "Record written");
    Ok(())
}

#[async_trait]
impl RecordStore for FileStore {
    async fn read_balance(&self, name: &str) -> Result<BalanceRecord, StoreError> {
        read_json(self.balance_path(name)).await
    }

    async fn write_balance(&self, name: &str, record: BalanceRecord) -> Result<(), StoreError> {
        write_json(self.balance_path(name), &record).await
    }

    async fn read_win_count(&self, name: &str) -> Result<WinCountRecord, StoreError> {
        read_json(self.wins_path(name)).await
    }

    async fn write_win_count(&self, name: &str, record: WinCountRecord) -> Result<(), StoreError> {
        write_json(self.wins_path(name), &record).await
    }

    async fn read_guess_session(&self) -> Result<GuessSession, StoreError> {
        read_json(self.guesses_path()).await
    }

    async fn write_guess_session(&self, session: &GuessSession) -> Result<(), StoreError> {
        write_json(self.guesses_path(), session).await
    }

    async fn prepare(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                path: self.root.clone(),
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
