// ABOUTME: Persistence layer for eventhub, one repository contract over three storage substrates.
// ABOUTME: Provides SQLite, XML and JSON backends, a token-driven factory, and a thin service layer.

pub mod config;
pub mod document;
pub mod error;
pub mod factory;
pub mod json;
pub mod persist;
pub mod record;
pub mod repository;
pub mod schema;
pub mod service;
pub mod sqlite;
pub mod xml;

pub use config::{ConfigError, StorageKind, StoreConfig};
pub use document::{DocumentFormat, DocumentRepository};
pub use error::{StoreError, StoreResult};
pub use factory::{AnyRepository, RepositoryFactory};
pub use json::{JsonFormat, JsonRepository};
pub use persist::{Persist, RecordSource, Resolver};
pub use record::{FieldValue, Record};
pub use repository::Repository;
pub use schema::{Column, ColumnKind, Link, Schema, schema_for};
pub use service::{EventService, Wishlist};
pub use sqlite::SqliteRepository;
pub use xml::{XmlFormat, XmlRepository};
