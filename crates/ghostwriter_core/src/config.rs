//! Runtime configuration.
//!
//! # Responsibility
//! - Collect storage, rewrite and logging settings with sensible defaults.
//! - Read overrides from the process environment.
//! - Open the configured storage backend.
//!
//! # Invariants
//! - Malformed numeric overrides fall back to defaults instead of failing.
//! - An unknown backend name is rejected.

use crate::repo::note_store::NOTES_STORAGE_KEY;
use crate::rewrite::GeminiConfig;
use crate::storage::{
    BlobStorage, FileBlobStorage, SqliteBlobStorage, StorageError, StorageResult,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

pub const ENV_DATA_DIR: &str = "GHOSTWRITER_DATA_DIR";
pub const ENV_BACKEND: &str = "GHOSTWRITER_BACKEND";
pub const ENV_LOG_LEVEL: &str = "GHOSTWRITER_LOG_LEVEL";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "GHOSTWRITER_GEMINI_MODEL";
pub const ENV_GEMINI_BASE_URL: &str = "GHOSTWRITER_GEMINI_BASE_URL";
pub const ENV_REWRITE_TIMEOUT_MS: &str = "GHOSTWRITER_REWRITE_TIMEOUT_MS";

const DATA_DIR_NAME: &str = ".ghostwriter";
const SQLITE_FILE_NAME: &str = "ghostwriter.sqlite3";

/// Which blob backend holds the notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    File,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "file" | "json" => Ok(Self::File),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownBackend(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownBackend(name) => {
                write!(f, "unknown storage backend `{name}`; expected sqlite|file")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings for one core instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    pub storage_key: String,
    pub log_level: String,
    pub rewrite: GeminiConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: StorageBackend::default(),
            storage_key: NOTES_STORAGE_KEY.to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            rewrite: GeminiConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup`, which maps variable names to values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = non_empty(lookup(ENV_DATA_DIR)) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = non_empty(lookup(ENV_BACKEND)) {
            config.backend = backend.parse()?;
        }
        if let Some(level) = non_empty(lookup(ENV_LOG_LEVEL)) {
            config.log_level = level;
        }
        config.rewrite.api_key = non_empty(lookup(ENV_GEMINI_API_KEY));
        if let Some(model) = non_empty(lookup(ENV_GEMINI_MODEL)) {
            config.rewrite.model = model;
        }
        if let Some(base_url) = non_empty(lookup(ENV_GEMINI_BASE_URL)) {
            config.rewrite.base_url = base_url;
        }
        if let Some(raw) = non_empty(lookup(ENV_REWRITE_TIMEOUT_MS)) {
            match raw.parse::<u64>() {
                Ok(timeout_ms) if timeout_ms > 0 => config.rewrite.timeout_ms = timeout_ms,
                _ => warn!(
                    "event=config_load module=config status=fallback key={} value={} default={}",
                    ENV_REWRITE_TIMEOUT_MS, raw, config.rewrite.timeout_ms
                ),
            }
        }

        Ok(config)
    }

    /// Directory for rolling log files.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(SQLITE_FILE_NAME)
    }

    /// Opens the configured backend under `data_dir`.
    pub fn open_storage(&self) -> StorageResult<Box<dyn BlobStorage + Send>> {
        match self.backend {
            StorageBackend::Sqlite => {
                // The file backend creates its own directory; SQLite does not.
                std::fs::create_dir_all(&self.data_dir).map_err(|source| StorageError::Io {
                    path: self.data_dir.clone(),
                    source,
                })?;
                Ok(Box::new(SqliteBlobStorage::open(self.sqlite_path())?))
            }
            StorageBackend::File => Ok(Box::new(FileBlobStorage::new(self.data_dir.clone())?)),
        }
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
