// ABOUTME: Configuration loading for the eventhub server.
// ABOUTME: Combines the bind address from EVENTHUB_BIND with the store configuration.

use std::net::SocketAddr;

use eventhub_store::{ConfigError, StoreConfig};
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:7340";

/// Errors that can occur during server configuration loading.
#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("EVENTHUB_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error(transparent)]
    Store(#[from] ConfigError),
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - EVENTHUB_BIND: socket address to bind (default: 127.0.0.1:7340)
    /// - EVENTHUB_STORAGE, EVENTHUB_HOME: see `StoreConfig::from_env`
    pub fn from_env() -> Result<Self, ServerConfigError> {
        let bind_str = std::env::var("EVENTHUB_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = parse_bind(&bind_str)?;
        let store = StoreConfig::from_env()?;
        Ok(Self { bind, store })
    }
}

pub fn parse_bind(raw: &str) -> Result<SocketAddr, ServerConfigError> {
    raw.parse()
        .map_err(|_| ServerConfigError::InvalidBind(raw.to_string()))
}
