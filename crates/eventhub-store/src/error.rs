// ABOUTME: Unified error type for every repository backend and the factory.
// ABOUTME: Missing IDs on reads are not errors; they surface as None from get_by_id.

use std::path::{Path, PathBuf};

use eventhub_core::{EntityId, EntityKind};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `update` on a document backend found no element with the ID.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    /// An ID filter matched more than one stored element.
    #[error("store corrupt: {count} {kind} entries share id {id}")]
    DuplicateId {
        kind: EntityKind,
        id: EntityId,
        count: usize,
    },

    /// A write referenced an entity that does not exist in the same store.
    #[error("{kind} references {target} {id}, which is not stored")]
    DanglingReference {
        kind: EntityKind,
        target: EntityKind,
        id: EntityId,
    },

    /// The relational backend refused to delete a row other rows point at.
    #[error("{kind} {id} is still referenced and cannot be deleted")]
    Referenced { kind: EntityKind, id: EntityId },

    /// An explicit ID below 1 was handed to `add` or `update`.
    #[error("{kind} id {id} is out of range, stored ids start at 1")]
    InvalidId { kind: EntityKind, id: EntityId },

    /// The highest stored ID is `i64::MAX`, so max + 1 allocation has nowhere to go.
    #[error("no {kind} ids left to allocate")]
    IdsExhausted { kind: EntityKind },

    /// `update` was given an entity that was never assigned an ID.
    #[error("{kind} has no assigned id")]
    UnassignedId { kind: EntityKind },

    /// Malformed stored content, or a value that cannot be represented.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File I/O failure.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl StoreError {
    /// Create a file I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a serialization error for unparseable file content.
    pub fn malformed(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Serialization(format!("{}: {}", path.display(), message))
    }
}

/// Convenience type alias for repository results.
pub type StoreResult<T> = Result<T, StoreError>;
