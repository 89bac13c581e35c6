// ABOUTME: Storage configuration: which backend to use and where its data lives.
// ABOUTME: Reads EVENTHUB_STORAGE and EVENTHUB_HOME; an unknown storage token fails fast.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "eventhub.db";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown storage kind {0:?}; expected one of relational, xml, json")]
    UnknownStorageKind(String),
}

/// The closed set of storage backends a repository can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Relational,
    Xml,
    Json,
}

impl StorageKind {
    pub const ALL: [StorageKind; 3] = [Self::Relational, Self::Xml, Self::Json];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Xml => "xml",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    /// Accepts exactly `relational`, `xml` or `json`. There is no fallback.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "relational" => Ok(Self::Relational),
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnknownStorageKind(other.to_string())),
        }
    }
}

/// Where and how repositories persist their data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub kind: StorageKind,
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(kind: StorageKind, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            data_dir: data_dir.into(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - EVENTHUB_STORAGE: relational | xml | json (default: json)
    /// - EVENTHUB_HOME: data directory (default: ~/.eventhub)
    ///
    /// A set but unrecognised EVENTHUB_STORAGE is an error, not a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let kind = match std::env::var("EVENTHUB_STORAGE") {
            Ok(token) if !token.is_empty() => token.parse()?,
            _ => StorageKind::Json,
        };

        let data_dir = std::env::var("EVENTHUB_HOME")
            .ok()
            .filter(|h| !h.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".eventhub")
            });

        Ok(Self { kind, data_dir })
    }

    /// Path of the SQLite database used by the relational backend.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}
