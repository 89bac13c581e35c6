// ABOUTME: Builds repositories for any entity kind from a StoreConfig or a raw storage token.
// ABOUTME: AnyRepository is the closed set of backends, delegating the repository contract to each.

use std::fs;
use std::path::Path;

use eventhub_core::EntityId;

use crate::config::{StorageKind, StoreConfig};
use crate::error::{StoreError, StoreResult};
use crate::json::JsonRepository;
use crate::persist::Persist;
use crate::repository::Repository;
use crate::sqlite::SqliteRepository;
use crate::xml::XmlRepository;

/// A repository on whichever backend the configuration selected.
pub enum AnyRepository<T> {
    Relational(SqliteRepository<T>),
    Xml(XmlRepository<T>),
    Json(JsonRepository<T>),
}

impl<T> AnyRepository<T> {
    pub fn kind(&self) -> StorageKind {
        match self {
            Self::Relational(_) => StorageKind::Relational,
            Self::Xml(_) => StorageKind::Xml,
            Self::Json(_) => StorageKind::Json,
        }
    }
}

macro_rules! delegate {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            AnyRepository::Relational($repo) => $call,
            AnyRepository::Xml($repo) => $call,
            AnyRepository::Json($repo) => $call,
        }
    };
}

impl<T: Persist> Repository<T> for AnyRepository<T> {
    fn get_by_id(&self, id: EntityId) -> StoreResult<Option<T>> {
        delegate!(self, repo => repo.get_by_id(id))
    }

    fn get_all(&self) -> StoreResult<Vec<T>> {
        delegate!(self, repo => repo.get_all())
    }

    fn add(&self, entity: &T) -> StoreResult<EntityId> {
        delegate!(self, repo => repo.add(entity))
    }

    fn update(&self, entity: &T) -> StoreResult<()> {
        delegate!(self, repo => repo.update(entity))
    }

    fn delete(&self, id: EntityId) -> StoreResult<()> {
        delegate!(self, repo => repo.delete(id))
    }

    fn next_id(&self) -> StoreResult<EntityId> {
        delegate!(self, repo => repo.next_id())
    }

    fn count(&self) -> StoreResult<usize> {
        delegate!(self, repo => repo.count())
    }
}

/// Creates repositories bound to one storage configuration.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: StoreConfig,
}

impl RepositoryFactory {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create a repository for `T`, creating the data directory if needed.
    pub fn create<T: Persist>(&self) -> StoreResult<AnyRepository<T>> {
        let dir = &self.config.data_dir;
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let repo = match self.config.kind {
            StorageKind::Relational => {
                AnyRepository::Relational(SqliteRepository::open(&self.config.database_path())?)
            }
            StorageKind::Xml => AnyRepository::Xml(XmlRepository::new(dir)),
            StorageKind::Json => AnyRepository::Json(JsonRepository::new(dir)),
        };
        tracing::debug!("created {} repository for {}", self.config.kind, T::KIND);
        Ok(repo)
    }

    /// Parse `token` as a storage kind and create a repository under `dir`.
    /// Unknown tokens are a configuration error.
    pub fn create_from_token<T: Persist>(
        token: &str,
        dir: &Path,
    ) -> StoreResult<AnyRepository<T>> {
        let kind: StorageKind = token.parse()?;
        Self::new(StoreConfig::new(kind, dir)).create()
    }
}
